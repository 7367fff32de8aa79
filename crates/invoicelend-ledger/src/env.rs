//! Transaction host.
//!
//! Every entry point runs as one atomic unit through [`Env::transact`]. The
//! host hands the operation a [`Ctx`] that journals what it changes: the
//! prior entry of every storage key on first touch, each accepted asset
//! transfer and the event log length. On `Err` the journal is replayed
//! backwards so a failed invocation leaves no trace; the cost is bounded by
//! what the transaction touched, not by the size of the ledger. On `Ok` the
//! host extends the TTL of every key the transaction wrote as the commit's
//! final step.
//!
//! Reads outside a transaction go through [`StateRead`], implemented by both
//! [`Env`] and [`Ctx`], so view functions and mutating code share the same
//! loaders.

use std::collections::{BTreeMap, BTreeSet};

use invoicelend_types::{
    Address, Amount, EventKind, ProtocolSettings, Result, Timestamp, TxId,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::asset::AssetLedger;
use crate::events::EventLog;
use crate::storage::{DataKey, Storage, StoredEntry};
use crate::ttl::TtlManager;

/// Read access to ledger state at the current ledger time.
pub trait StateRead {
    /// Current ledger time.
    fn now(&self) -> Timestamp;

    /// Read a live entry.
    ///
    /// # Errors
    /// Returns `Serialization` if the stored value does not decode as `T`.
    fn get<T: DeserializeOwned>(&self, key: &DataKey) -> Result<Option<T>>;

    /// Whether a live entry exists under `key`.
    fn has(&self, key: &DataKey) -> bool;

    /// Whether `key` was ever written and not yet reclaimed, live or not.
    fn exists(&self, key: &DataKey) -> bool;

    /// Stablecoin balance of `holder`.
    fn balance(&self, token: &Address, holder: &Address) -> Amount;
}

/// One accepted transfer, kept for rollback.
#[derive(Debug, Clone, Copy)]
struct TransferRecord {
    token: Address,
    from: Address,
    to: Address,
    amount: Amount,
}

/// Undo information for one in-flight transaction.
#[derive(Debug, Default)]
struct Journal {
    /// Entry under each touched key before its first change.
    prior: BTreeMap<DataKey, Option<StoredEntry>>,
    transfers: Vec<TransferRecord>,
    /// Keys whose values were written, for TTL extension at commit.
    written: BTreeSet<DataKey>,
}

impl Journal {
    fn touch(&mut self, storage: &Storage, key: DataKey) {
        self.prior.entry(key).or_insert_with(|| storage.entry(&key));
    }
}

/// The ledger environment: storage, external asset ledger, event log and
/// ledger clock.
#[derive(Debug)]
pub struct Env<A: AssetLedger> {
    storage: Storage,
    assets: A,
    events: EventLog,
    ttl: TtlManager,
    now: Timestamp,
}

impl<A: AssetLedger> Env<A> {
    /// Create an empty environment at ledger time 0.
    #[must_use]
    pub fn new(assets: A, settings: &ProtocolSettings) -> Self {
        Self {
            storage: Storage::new(settings.min_entry_ttl_secs),
            assets,
            events: EventLog::new(),
            ttl: TtlManager::new(settings.ttl_window_secs),
            now: 0,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.now
    }

    /// Move the ledger clock. The clock never runs backwards.
    pub fn set_timestamp(&mut self, now: Timestamp) {
        self.now = self.now.max(now);
    }

    /// Advance the ledger clock by `secs`.
    pub fn advance(&mut self, secs: u64) {
        self.now = self.now.saturating_add(secs);
    }

    /// Run `f` as one atomic transaction named `op`.
    ///
    /// # Errors
    /// Propagates the error returned by `f`, after rolling back every
    /// storage write, asset transfer and event of the invocation.
    pub fn transact<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Ctx<'_>) -> Result<T>,
    ) -> Result<T> {
        let tx_id = TxId::new();
        let span = tracing::debug_span!("tx", %tx_id, op);
        let _enter = span.enter();

        let events_len = self.events.len();
        let mut journal = Journal::default();

        let result = {
            let mut ctx = Ctx {
                storage: &mut self.storage,
                assets: &mut self.assets,
                events: &mut self.events,
                journal: &mut journal,
                ttl: self.ttl,
                now: self.now,
                tx_id,
            };
            f(&mut ctx)
        };

        match result {
            Ok(value) => {
                self.ttl
                    .extend_all(&mut self.storage, journal.written.iter(), self.now);
                tracing::debug!(writes = journal.written.len(), "Transaction committed");
                Ok(value)
            }
            Err(err) => {
                self.rollback(journal, events_len);
                tracing::warn!(code = err.code(), error = %err, "Transaction rolled back");
                Err(err)
            }
        }
    }

    fn rollback(&mut self, journal: Journal, events_len: usize) {
        for (key, entry) in journal.prior {
            self.storage.restore(key, entry);
        }
        for t in journal.transfers.iter().rev() {
            if let Err(err) = self
                .assets
                .revert_transfer(&t.token, &t.from, &t.to, t.amount)
            {
                tracing::error!(
                    code = err.code(),
                    from = %t.from,
                    to = %t.to,
                    amount = %t.amount,
                    "Asset ledger refused a compensating transfer"
                );
            }
        }
        self.events.truncate(events_len);
    }

    /// Reclaim entries whose liveness horizon has passed.
    pub fn sweep_expired(&mut self) -> usize {
        let swept = self.storage.sweep_expired(self.now);
        if swept > 0 {
            tracing::info!(swept, now = self.now, "Expired entries reclaimed");
        }
        swept
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn assets(&self) -> &A {
        &self.assets
    }

    /// Direct access to the asset ledger, e.g. for the stablecoin issuer to
    /// fund accounts. Changes made here are not part of any transaction.
    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    #[must_use]
    pub fn ttl(&self) -> TtlManager {
        self.ttl
    }
}

impl<A: AssetLedger> StateRead for Env<A> {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn get<T: DeserializeOwned>(&self, key: &DataKey) -> Result<Option<T>> {
        self.storage.get(key, self.now)
    }

    fn has(&self, key: &DataKey) -> bool {
        self.storage.has(key, self.now)
    }

    fn exists(&self, key: &DataKey) -> bool {
        self.storage.contains(key)
    }

    fn balance(&self, token: &Address, holder: &Address) -> Amount {
        self.assets.balance(token, holder)
    }
}

/// Handle to the state of one in-flight transaction.
pub struct Ctx<'a> {
    storage: &'a mut Storage,
    assets: &'a mut dyn AssetLedger,
    events: &'a mut EventLog,
    journal: &'a mut Journal,
    ttl: TtlManager,
    now: Timestamp,
    tx_id: TxId,
}

impl Ctx<'_> {
    #[must_use]
    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    /// Write `value` under `key`; the key's TTL is extended at commit.
    ///
    /// # Errors
    /// Returns `Serialization` if `value` cannot be encoded.
    pub fn set<T: Serialize>(&mut self, key: DataKey, value: &T) -> Result<()> {
        self.journal.touch(self.storage, key);
        self.storage.set(key, value, self.now)?;
        self.journal.written.insert(key);
        Ok(())
    }

    /// Keep a record alive until [`Ctx::release`] is called on it.
    pub fn pin(&mut self, key: DataKey) {
        self.journal.touch(self.storage, key);
        if self.storage.set_live_until(&key, Storage::PINNED) {
            tracing::debug!(key = ?key, "Entry pinned");
        }
    }

    /// Return a pinned record to the regular window, counted from now.
    pub fn release(&mut self, key: DataKey) {
        self.journal.touch(self.storage, key);
        let live_until = self.ttl.horizon(self.now);
        if self.storage.set_live_until(&key, live_until) {
            tracing::debug!(key = ?key, live_until, "Entry released");
        }
    }

    /// Move stablecoin through the external asset ledger.
    ///
    /// # Errors
    /// Propagates the asset ledger's rejection.
    pub fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        self.assets.transfer(token, from, to, amount)?;
        self.journal.transfers.push(TransferRecord {
            token: *token,
            from: *from,
            to: *to,
            amount,
        });
        tracing::debug!(%from, %to, %amount, "Asset transfer");
        Ok(())
    }

    /// Append an event to the log.
    ///
    /// # Errors
    /// Returns `Serialization` if the event cannot be hashed.
    pub fn emit(&mut self, kind: EventKind) -> Result<()> {
        self.events.push(kind, self.tx_id, self.now)?;
        Ok(())
    }
}

impl StateRead for Ctx<'_> {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn get<T: DeserializeOwned>(&self, key: &DataKey) -> Result<Option<T>> {
        self.storage.get(key, self.now)
    }

    fn has(&self, key: &DataKey) -> bool {
        self.storage.has(key, self.now)
    }

    fn exists(&self, key: &DataKey) -> bool {
        self.storage.contains(key)
    }

    fn balance(&self, token: &Address, holder: &Address) -> Amount {
        self.assets.balance(token, holder)
    }
}
