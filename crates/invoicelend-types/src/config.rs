//! Protocol configuration: the persisted singleton and the runtime settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Address, InvoiceId, InvoiceLendError, LoanId, PublicKey, Result, constants};

/// The process-wide protocol configuration, as persisted under the
/// `Admin`, `TokenAddress`, `Pool`, `Paused`, `BackendPubkey`,
/// `NextLoanId` and `NextInvoiceId` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// The only address allowed to pause, rotate keys or hand over admin.
    pub admin: Address,
    /// The settlement stablecoin on the external asset ledger.
    pub token_address: Address,
    /// The lending pool's own address.
    pub pool: Address,
    /// Trust backend key that signs mint requests.
    pub backend_pubkey: PublicKey,
    pub paused: bool,
    pub next_loan_id: LoanId,
    pub next_invoice_id: InvoiceId,
}

/// One-time deployment parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitParams {
    pub admin: Address,
    pub token_address: Address,
    pub pool: Address,
    pub backend_pubkey: PublicKey,
}

/// Tunable runtime settings, loadable from JSON.
///
/// Missing fields fall back to the defaults in [`constants`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSettings {
    /// Horizon every written entry is extended to, in seconds.
    pub ttl_window_secs: u64,
    /// Lifetime of a newly created entry before its first extension.
    pub min_entry_ttl_secs: u64,
    /// Simple annual interest rate, in basis points.
    pub interest_rate_bps: u32,
    /// Accrual basis for the interest formula.
    pub seconds_per_year: u64,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            ttl_window_secs: constants::DEFAULT_TTL_WINDOW_SECS,
            min_entry_ttl_secs: constants::DEFAULT_MIN_ENTRY_TTL_SECS,
            interest_rate_bps: constants::DEFAULT_INTEREST_RATE_BPS,
            seconds_per_year: constants::SECONDS_PER_YEAR,
        }
    }
}

impl ProtocolSettings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| InvoiceLendError::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a JSON settings file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject settings the ledger cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.seconds_per_year == 0 {
            return Err(InvoiceLendError::Configuration(
                "seconds_per_year must be > 0".to_string(),
            ));
        }
        if self.interest_rate_bps > constants::BPS_DENOMINATOR {
            return Err(InvoiceLendError::Configuration(format!(
                "interest_rate_bps {} exceeds {}",
                self.interest_rate_bps,
                constants::BPS_DENOMINATOR
            )));
        }
        if self.ttl_window_secs < self.min_entry_ttl_secs {
            return Err(InvoiceLendError::Configuration(format!(
                "ttl_window_secs {} is shorter than min_entry_ttl_secs {}",
                self.ttl_window_secs, self.min_entry_ttl_secs
            )));
        }
        Ok(())
    }
}
