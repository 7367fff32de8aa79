//! Liveness-window housekeeping.
//!
//! Every committed write extends the written entry to `now + window`. The
//! transaction host applies it to all keys touched by a transaction as the
//! commit's final step, so no entry point can skip it.

use invoicelend_types::Timestamp;

use crate::storage::{DataKey, Storage};

/// Extends entry horizons to a fixed window past the current ledger time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlManager {
    window: u64,
}

impl TtlManager {
    #[must_use]
    pub fn new(window: u64) -> Self {
        Self { window }
    }

    /// The configured window in seconds.
    #[must_use]
    pub fn window(&self) -> u64 {
        self.window
    }

    /// Horizon an entry refreshed at `now` is extended to.
    #[must_use]
    pub fn horizon(&self, now: Timestamp) -> Timestamp {
        now.saturating_add(self.window)
    }

    /// Extend one entry. Missing entries are skipped.
    pub fn extend(&self, storage: &mut Storage, key: &DataKey, now: Timestamp) {
        let live_until = self.horizon(now);
        if storage.extend_live_until(key, live_until) {
            tracing::debug!(key = ?key, live_until, "TTL extended");
        }
    }

    /// Extend every key in `keys`.
    pub fn extend_all<'a>(
        &self,
        storage: &mut Storage,
        keys: impl IntoIterator<Item = &'a DataKey>,
        now: Timestamp,
    ) {
        for key in keys {
            self.extend(storage, key, now);
        }
    }
}
