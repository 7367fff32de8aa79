//! # Loan: a principal advance secured by one escrowed invoice
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  repay_loan   ┌────────┐
//!   │ ACTIVE ├──────────────▶│ REPAID │
//!   └───┬────┘               └────────┘
//!       │ liquidate (now > due_date)
//!       ▼
//!   ┌───────────┐
//!   │ DEFAULTED │
//!   └───────────┘
//! ```
//!
//! Transitions are **monotonic**: `is_repaid` and `is_defaulted` each flip
//! false → true at most once and never together. A finalized loan is never
//! mutated again.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, InvoiceId, InvoiceLendError, LoanId, Result, Timestamp};

/// Lifecycle state derived from a loan's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// Principal outstanding; invoice escrowed.
    Active,
    /// Principal plus interest paid back; invoice released to its owner.
    Repaid,
    /// Liquidated after the due date; invoice owned by the pool.
    Defaulted,
}

impl LoanStatus {
    /// Can a loan in this state transition to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Active, Self::Repaid | Self::Defaulted))
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Repaid => write!(f, "REPAID"),
            Self::Defaulted => write!(f, "DEFAULTED"),
        }
    }
}

/// A loan record. The invoice is referenced by id only; its fields are never
/// copied here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub borrower: Address,
    pub invoice_id: InvoiceId,
    pub principal: Amount,
    /// Zero until repayment, then the interest actually charged.
    pub interest: Amount,
    pub start_time: Timestamp,
    pub due_date: Timestamp,
    pub is_repaid: bool,
    pub is_defaulted: bool,
}

impl Loan {
    /// A freshly originated, active loan.
    #[must_use]
    pub fn originate(
        loan_id: LoanId,
        borrower: Address,
        invoice_id: InvoiceId,
        principal: Amount,
        start_time: Timestamp,
        due_date: Timestamp,
    ) -> Self {
        Self {
            loan_id,
            borrower,
            invoice_id,
            principal,
            interest: Amount::ZERO,
            start_time,
            due_date,
            is_repaid: false,
            is_defaulted: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> LoanStatus {
        match (self.is_repaid, self.is_defaulted) {
            (true, _) => LoanStatus::Repaid,
            (false, true) => LoanStatus::Defaulted,
            (false, false) => LoanStatus::Active,
        }
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status() != LoanStatus::Active
    }

    /// Whether the loan is past due at `now` (strictly after `due_date`).
    #[must_use]
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        now > self.due_date
    }

    /// Transition to REPAID, recording the interest charged.
    ///
    /// # Errors
    /// Returns `AlreadyFinalized` if the loan is not ACTIVE.
    pub fn mark_repaid(&mut self, interest: Amount) -> Result<()> {
        if !self.status().can_transition_to(LoanStatus::Repaid) {
            return Err(InvoiceLendError::AlreadyFinalized(self.loan_id));
        }
        self.interest = interest;
        self.is_repaid = true;
        Ok(())
    }

    /// Transition to DEFAULTED.
    ///
    /// # Errors
    /// Returns `AlreadyFinalized` if the loan is not ACTIVE.
    pub fn mark_defaulted(&mut self) -> Result<()> {
        if !self.status().can_transition_to(LoanStatus::Defaulted) {
            return Err(InvoiceLendError::AlreadyFinalized(self.loan_id));
        }
        self.is_defaulted = true;
        Ok(())
    }
}

/// Outcome of a successful repayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repayment {
    pub loan_id: LoanId,
    pub principal: Amount,
    pub interest: Amount,
    pub total: Amount,
}
