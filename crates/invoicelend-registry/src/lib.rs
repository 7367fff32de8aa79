//! # invoicelend-registry
//!
//! The invoice side of InvoiceLend: trusted-signer verification, the admin
//! gate and the invoice registry.
//!
//! ```text
//! signed MintRequest ──▶ InvoiceRegistry::mint
//!                          ├─ AdminControl::load_config
//!                          ├─ due_date > now
//!                          └─ SignatureVerifier::verify(payload, sig, backend_pubkey)
//!
//! LendingLedger (pool) ──▶ set_escrowed / transfer_ownership
//! ```

pub mod admin;
pub mod invoice_registry;
pub mod signature;

pub use admin::AdminControl;
pub use invoice_registry::InvoiceRegistry;
pub use signature::{BackendSigner, Ed25519Verifier, SignatureVerifier};
