//! System-wide constants for InvoiceLend.

/// Seconds in a 365-day year, the interest accrual basis.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Nominal annual interest rate in basis points (5%).
pub const DEFAULT_INTEREST_RATE_BPS: u32 = 500;

/// Basis points in 100%.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Liveness window every written entry is extended to (30 days).
pub const DEFAULT_TTL_WINDOW_SECS: u64 = 30 * 24 * 3600;

/// Lifetime of a freshly created entry before any extension
/// (4096 ledgers at 5 s).
pub const DEFAULT_MIN_ENTRY_TTL_SECS: u64 = 4096 * 5;

/// First id handed out by both id counters.
pub const FIRST_RECORD_ID: u64 = 1;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol name.
pub const PROTOCOL_NAME: &str = "InvoiceLend";
