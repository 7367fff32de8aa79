//! # invoicelend-types
//!
//! Shared types, errors, and configuration for the **InvoiceLend** protocol.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`InvoiceId`], [`LoanId`], [`TxId`], [`PublicKey`], [`Signature`], [`ContentHash`]
//! - **Amounts**: [`Amount`], a 7-decimal scaled integer
//! - **Invoice model**: [`Invoice`], [`MintRequest`], [`Currency`]
//! - **Loan model**: [`Loan`], [`LoanStatus`], [`Repayment`]
//! - **Events**: [`Event`], [`EventKind`]
//! - **Configuration**: [`ProtocolConfig`], [`InitParams`], [`ProtocolSettings`]
//! - **Errors**: [`InvoiceLendError`] with `IL_ERR_` prefix codes
//! - **Constants**: protocol-wide defaults

pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod invoice;
pub mod loan;

// Re-export all primary types at crate root for ergonomic imports:
//   use invoicelend_types::{Invoice, Loan, Amount, ...};

pub use amount::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use invoice::*;
pub use loan::*;

// Constants are accessed via `invoicelend_types::constants::FOO`
// (not re-exported to avoid name collisions).
