//! Persisted key/value substrate.
//!
//! Values are JSON-serialized records keyed by [`DataKey`]. Entries live in
//! one of two tiers:
//!
//! - **Instance** entries (the protocol configuration) are pinned for the
//!   life of the deployment and are never reclaimed.
//! - **Record** entries (invoices and loans) carry a liveness horizon
//!   (`live_until`). Once ledger time passes it the entry is archived: reads
//!   no longer see it and [`Storage::sweep_expired`] reclaims it. The
//!   [`TtlManager`](crate::TtlManager) pushes horizons forward on every
//!   committed write, and a record backing an active loan is pinned until the
//!   loan is settled.

use std::collections::BTreeMap;

use invoicelend_types::{InvoiceId, LoanId, Result, Timestamp};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Tagged identifiers of every persisted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum DataKey {
    Admin,
    TokenAddress,
    Pool,
    Paused,
    BackendPubkey,
    NextLoanId,
    NextInvoiceId,
    Invoice(InvoiceId),
    Loan(LoanId),
}

impl DataKey {
    /// Configuration singletons, stored in the never-reclaimed instance tier.
    #[must_use]
    pub fn is_instance(&self) -> bool {
        !matches!(self, Self::Invoice(_) | Self::Loan(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredEntry {
    value: Vec<u8>,
    live_until: Timestamp,
}

/// In-memory key/value store with per-entry liveness horizons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Storage {
    entries: BTreeMap<DataKey, StoredEntry>,
    /// Lifetime granted to a record entry on creation.
    min_entry_ttl: u64,
}

impl Storage {
    /// Horizon of pinned entries: they never lapse.
    pub const PINNED: Timestamp = Timestamp::MAX;

    /// Create an empty store whose new record entries live `min_entry_ttl`
    /// seconds.
    #[must_use]
    pub fn new(min_entry_ttl: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            min_entry_ttl,
        }
    }

    /// Whether a live entry exists under `key` at `now`.
    #[must_use]
    pub fn has(&self, key: &DataKey, now: Timestamp) -> bool {
        self.entries.get(key).is_some_and(|e| e.live_until >= now)
    }

    /// Whether anything is stored under `key`, archived entries included.
    #[must_use]
    pub fn contains(&self, key: &DataKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Read and deserialize a live entry.
    ///
    /// # Errors
    /// Returns `Serialization` if the stored bytes do not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &DataKey, now: Timestamp) -> Result<Option<T>> {
        match self.entries.get(key) {
            Some(entry) if entry.live_until >= now => Ok(Some(serde_json::from_slice(&entry.value)?)),
            _ => Ok(None),
        }
    }

    /// Serialize and write `value`.
    ///
    /// Instance entries are pinned. A live record keeps its horizon; a new
    /// (or archived) one starts with the minimum entry lifetime.
    ///
    /// # Errors
    /// Returns `Serialization` if `value` cannot be encoded.
    pub fn set<T: Serialize>(&mut self, key: DataKey, value: &T, now: Timestamp) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        let live_until = match self.entries.get(&key) {
            _ if key.is_instance() => Self::PINNED,
            Some(entry) if entry.live_until >= now => entry.live_until,
            _ => now.saturating_add(self.min_entry_ttl),
        };
        self.entries.insert(
            key,
            StoredEntry {
                value: bytes,
                live_until,
            },
        );
        Ok(())
    }

    /// Current horizon of an entry (live or archived).
    #[must_use]
    pub fn live_until(&self, key: &DataKey) -> Option<Timestamp> {
        self.entries.get(key).map(|e| e.live_until)
    }

    /// Raise an entry's horizon to `live_until`. Never lowers it.
    ///
    /// Returns `false` if there is no such entry.
    pub fn extend_live_until(&mut self, key: &DataKey, live_until: Timestamp) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.live_until = entry.live_until.max(live_until);
                true
            }
            None => false,
        }
    }

    /// Set a record's horizon to exactly `live_until`, lowering it if need
    /// be. Instance entries stay pinned.
    ///
    /// Returns `false` if there is no such entry.
    pub fn set_live_until(&mut self, key: &DataKey, live_until: Timestamp) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                if !key.is_instance() {
                    entry.live_until = live_until;
                }
                true
            }
            None => false,
        }
    }

    /// Reclaim every entry whose horizon is before `now`. Returns the count.
    pub fn sweep_expired(&mut self, now: Timestamp) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.live_until >= now);
        before - self.entries.len()
    }

    /// Number of entries, archived ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw copy of the entry under `key`, for the transaction journal.
    pub(crate) fn entry(&self, key: &DataKey) -> Option<StoredEntry> {
        self.entries.get(key).cloned()
    }

    /// Put back a journaled entry (or its absence).
    pub(crate) fn restore(&mut self, key: DataKey, entry: Option<StoredEntry>) {
        match entry {
            Some(entry) => {
                self.entries.insert(key, entry);
            }
            None => {
                self.entries.remove(&key);
            }
        }
    }
}
