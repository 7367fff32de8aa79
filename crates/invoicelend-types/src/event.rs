//! Protocol events for the audit trail.
//!
//! Every successful state transition appends an [`Event`] to the ledger's
//! hash-chained log. Off-ledger readers (the metadata API) consume events
//! instead of polling storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, InvoiceId, LoanId, PublicKey, Timestamp, TxId};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Initialized {
        admin: Address,
        pool: Address,
    },
    InvoiceMinted {
        invoice_id: InvoiceId,
        owner: Address,
        face_value: Amount,
    },
    InvoiceEscrowed {
        invoice_id: InvoiceId,
    },
    InvoiceReleased {
        invoice_id: InvoiceId,
    },
    InvoiceOwnershipTransferred {
        invoice_id: InvoiceId,
        from: Address,
        to: Address,
    },
    LoanCreated {
        loan_id: LoanId,
        borrower: Address,
        invoice_id: InvoiceId,
        principal: Amount,
    },
    LoanRepaid {
        loan_id: LoanId,
        borrower: Address,
        total: Amount,
    },
    LoanLiquidated {
        loan_id: LoanId,
        invoice_id: InvoiceId,
        liquidator: Address,
    },
    PauseSet {
        paused: bool,
    },
    BackendKeyRotated {
        pubkey: PublicKey,
    },
    AdminChanged {
        previous: Address,
        admin: Address,
    },
    PoolDeposit {
        from: Address,
        amount: Amount,
    },
}

impl EventKind {
    /// Stable topic name, e.g. `loan_repaid`.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Initialized { .. } => "initialized",
            Self::InvoiceMinted { .. } => "mint",
            Self::InvoiceEscrowed { .. } => "invoice_escrowed",
            Self::InvoiceReleased { .. } => "invoice_released",
            Self::InvoiceOwnershipTransferred { .. } => "invoice_transferred",
            Self::LoanCreated { .. } => "loan_created",
            Self::LoanRepaid { .. } => "loan_repaid",
            Self::LoanLiquidated { .. } => "loan_liquidated",
            Self::PauseSet { .. } => "pause_set",
            Self::BackendKeyRotated { .. } => "backend_key_rotated",
            Self::AdminChanged { .. } => "admin_changed",
            Self::PoolDeposit { .. } => "deposit",
        }
    }
}

/// An entry of the hash-chained event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Position in the log, starting at 0.
    pub seq: u64,
    /// The transaction that emitted this event.
    pub tx_id: TxId,
    /// Ledger time at emission.
    pub ledger_time: Timestamp,
    pub kind: EventKind,
    /// Hash of the preceding event (all zeroes for the first).
    pub prev_hash: [u8; 32],
    /// SHA-256 over `prev_hash`, `seq`, `tx_id`, `ledger_time` and the serialized kind.
    pub hash: [u8; 32],
}

impl Event {
    /// Ledger time as a UTC datetime, `None` if out of chrono's range.
    #[must_use]
    pub fn emitted_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.ledger_time)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}
