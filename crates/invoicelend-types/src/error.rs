//! Error types for the InvoiceLend protocol.
//!
//! All errors use the `IL_ERR_` prefix convention for easy grepping in logs.
//! Every variant is a transaction-aborting rejection: the host rolls back
//! all state written by the failing invocation before returning it.
//!
//! Error codes are grouped by subsystem:
//! - 1xx: Invoice errors
//! - 2xx: Loan errors
//! - 3xx: Balance errors
//! - 4xx: Protocol / admin errors
//! - 5xx: Storage errors
//! - 9xx: General / internal errors

use std::fmt;

use thiserror::Error;

use crate::{Address, Amount, InvoiceId, LoanId};

/// A reference to a persisted record, used by [`InvoiceLendError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    Invoice(InvoiceId),
    Loan(LoanId),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invoice(id) => write!(f, "{id}"),
            Self::Loan(id) => write!(f, "{id}"),
        }
    }
}

/// Central error enum for all InvoiceLend operations.
#[derive(Debug, Error)]
pub enum InvoiceLendError {
    // =================================================================
    // Invoice Errors (1xx)
    // =================================================================
    /// The invoice due date is not strictly in the future.
    #[error("IL_ERR_100: Invoice expired: due {due_date}, ledger time {now}")]
    InvoiceExpired { due_date: u64, now: u64 },

    /// The backend signature over the mint payload did not verify.
    #[error("IL_ERR_101: Invalid backend signature")]
    InvalidSignature,

    /// The invoice is already pledged to a live loan.
    #[error("IL_ERR_102: Invoice already escrowed: {0}")]
    AlreadyEscrowed(InvoiceId),

    /// The currency symbol is malformed.
    #[error("IL_ERR_103: Invalid currency symbol: {0:?}")]
    InvalidCurrency(String),

    // =================================================================
    // Loan Errors (2xx)
    // =================================================================
    /// The requested principal is larger than the collateral's face value.
    #[error("IL_ERR_200: Principal {principal} exceeds face value {face_value}")]
    PrincipalExceedsFaceValue { principal: Amount, face_value: Amount },

    /// The loan has already been repaid or liquidated.
    #[error("IL_ERR_201: Loan already finalized: {0}")]
    AlreadyFinalized(LoanId),

    /// The loan is still within its term and cannot be liquidated.
    #[error("IL_ERR_202: Loan not defaulted: due {due_date}, ledger time {now}")]
    LoanNotDefaulted { due_date: u64, now: u64 },

    /// An amount that must be strictly positive was zero or negative.
    #[error("IL_ERR_203: Invalid amount: {0}")]
    InvalidAmount(Amount),

    // =================================================================
    // Balance Errors (3xx)
    // =================================================================
    /// The payer's stablecoin balance cannot cover the transfer.
    #[error("IL_ERR_300: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// The pool does not hold enough stablecoin to disburse a loan.
    #[error("IL_ERR_301: Insufficient pool liquidity: need {needed}, have {available}")]
    InsufficientLiquidity { needed: Amount, available: Amount },

    /// Holder balances of a token no longer add up to its minted supply.
    #[error("IL_ERR_302: Supply mismatch for {token}: expected {expected}, actual {actual}")]
    SupplyMismatch {
        token: Address,
        expected: Amount,
        actual: Amount,
    },

    // =================================================================
    // Protocol / Admin Errors (4xx)
    // =================================================================
    /// Borrow, repay and liquidate are blocked while paused.
    #[error("IL_ERR_400: Contract paused")]
    ContractPaused,

    /// The caller is not permitted to invoke this entry point.
    #[error("IL_ERR_401: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The protocol configuration has not been written yet.
    #[error("IL_ERR_402: Protocol not initialized")]
    NotInitialized,

    /// `initialize` was called a second time.
    #[error("IL_ERR_403: Protocol already initialized")]
    AlreadyInitialized,

    // =================================================================
    // Storage Errors (5xx)
    // =================================================================
    /// The record does not exist (or was reclaimed by the substrate).
    #[error("IL_ERR_500: Not found: {0}")]
    NotFound(RecordRef),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Checked fixed-point or timestamp arithmetic overflowed.
    #[error("IL_ERR_900: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    /// Serialization / deserialization error.
    #[error("IL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid settings file, out-of-range values).
    #[error("IL_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("IL_ERR_903: I/O error: {0}")]
    Io(String),
}

impl InvoiceLendError {
    /// Shorthand for an [`InvoiceLendError::Unauthorized`] rejection.
    #[must_use]
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// The `IL_ERR_xxx` code of this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvoiceExpired { .. } => "IL_ERR_100",
            Self::InvalidSignature => "IL_ERR_101",
            Self::AlreadyEscrowed(_) => "IL_ERR_102",
            Self::InvalidCurrency(_) => "IL_ERR_103",
            Self::PrincipalExceedsFaceValue { .. } => "IL_ERR_200",
            Self::AlreadyFinalized(_) => "IL_ERR_201",
            Self::LoanNotDefaulted { .. } => "IL_ERR_202",
            Self::InvalidAmount(_) => "IL_ERR_203",
            Self::InsufficientBalance { .. } => "IL_ERR_300",
            Self::InsufficientLiquidity { .. } => "IL_ERR_301",
            Self::SupplyMismatch { .. } => "IL_ERR_302",
            Self::ContractPaused => "IL_ERR_400",
            Self::Unauthorized { .. } => "IL_ERR_401",
            Self::NotInitialized => "IL_ERR_402",
            Self::AlreadyInitialized => "IL_ERR_403",
            Self::NotFound(_) => "IL_ERR_500",
            Self::ArithmeticOverflow { .. } => "IL_ERR_900",
            Self::Serialization(_) => "IL_ERR_901",
            Self::Configuration(_) => "IL_ERR_902",
            Self::Io(_) => "IL_ERR_903",
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, InvoiceLendError>;

impl From<std::io::Error> for InvoiceLendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for InvoiceLendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
