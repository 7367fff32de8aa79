//! # invoicelend-ledger
//!
//! The ledger substrate both registries run on.
//!
//! ## Components
//!
//! - [`Storage`] / [`DataKey`]: persisted key/value entries; pinned
//!   configuration plus records with liveness horizons
//! - [`TtlManager`]: extends horizons of written entries at commit
//! - [`Env`] / [`Ctx`]: all-or-nothing transaction host
//! - [`AssetLedger`] / [`MemoryAssetLedger`]: external stablecoin capability
//! - [`EventLog`]: hash-chained audit trail
//!
//! ## Atomicity
//!
//! ```text
//! Env::transact(op, f)
//!   ├─ f(&mut Ctx)          reads, writes, pins, transfers, events
//!   │                       (first touch of a key journals its prior entry)
//!   ├─ Err → restore journaled entries, revert transfers newest first,
//!   │        truncate event log, warn!(code)
//!   └─ Ok  → TtlManager::extend_all(written keys)
//! ```

pub mod asset;
pub mod env;
pub mod events;
pub mod storage;
pub mod ttl;

pub use asset::{AssetLedger, MemoryAssetLedger};
pub use env::{Ctx, Env, StateRead};
pub use events::EventLog;
pub use storage::{DataKey, Storage};
pub use ttl::TtlManager;
