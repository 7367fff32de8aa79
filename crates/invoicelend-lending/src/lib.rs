//! # invoicelend-lending
//!
//! Loans against tokenized invoices.
//!
//! ## Flow
//!
//! ```text
//! borrower ──borrow──▶ LendingLedger
//!                        ├─ InvoiceRegistry::set_escrowed(true)
//!                        ├─ Loan { ACTIVE }
//!                        └─ pool ──principal──▶ borrower
//!
//! repay_loan:  borrower ──principal + interest──▶ pool, invoice released
//! liquidate:   (past due) invoice owner := pool, invoice released
//! ```
//!
//! [`Protocol`] exposes the whole surface as atomic entry points.

pub mod interest;
pub mod lending_ledger;
pub mod protocol;

pub use interest::{InterestModel, calculate_interest};
pub use lending_ledger::LendingLedger;
pub use protocol::Protocol;
