//! Append-only, hash-chained event log.
//!
//! Each [`Event`] commits to its predecessor's hash, so an off-ledger reader
//! replaying the log can detect a dropped or altered entry with
//! [`EventLog::verify_chain`].

use invoicelend_types::{Event, EventKind, InvoiceLendError, Result, Timestamp, TxId};
use sha2::{Digest, Sha256};

const EVENT_HASH_DOMAIN: &[u8] = b"invoicelend:event:v1:";

/// Ordered list of emitted events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new event chained to the current tail.
    ///
    /// # Errors
    /// Returns `Serialization` if the kind cannot be encoded for hashing.
    pub fn push(&mut self, kind: EventKind, tx_id: TxId, now: Timestamp) -> Result<&Event> {
        let seq = u64::try_from(self.events.len()).map_err(|_| {
            InvoiceLendError::ArithmeticOverflow {
                context: "event sequence",
            }
        })?;
        let prev_hash = self.last_hash();
        let hash = compute_event_hash(&prev_hash, seq, tx_id, now, &kind)?;
        tracing::debug!(seq, topic = kind.topic(), %tx_id, "Event emitted");
        self.events.push(Event {
            seq,
            tx_id,
            ledger_time: now,
            kind,
            prev_hash,
            hash,
        });
        Ok(&self.events[self.events.len() - 1])
    }

    /// Hash of the newest event, all zeroes for an empty log.
    #[must_use]
    pub fn last_hash(&self) -> [u8; 32] {
        self.events.last().map_or([0u8; 32], |e| e.hash)
    }

    /// Recompute every link. Returns the sequence number of the first broken
    /// event, if any.
    #[must_use]
    pub fn verify_chain(&self) -> Option<u64> {
        let mut prev = [0u8; 32];
        for (seq, event) in (0u64..).zip(&self.events) {
            let expected =
                compute_event_hash(&prev, seq, event.tx_id, event.ledger_time, &event.kind);
            let intact = event.seq == seq
                && event.prev_hash == prev
                && expected.is_ok_and(|h| h == event.hash);
            if !intact {
                return Some(seq);
            }
            prev = event.hash;
        }
        None
    }

    /// Drop events past `len` (used to discard a rolled-back transaction).
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Events emitted by one transaction.
    pub fn by_tx(&self, tx_id: TxId) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.tx_id == tx_id)
    }

    #[must_use]
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }
}

fn compute_event_hash(
    prev_hash: &[u8; 32],
    seq: u64,
    tx_id: TxId,
    now: Timestamp,
    kind: &EventKind,
) -> Result<[u8; 32]> {
    let body = serde_json::to_vec(kind)?;
    let mut hasher = Sha256::new();
    hasher.update(EVENT_HASH_DOMAIN);
    hasher.update(prev_hash);
    hasher.update(seq.to_le_bytes());
    hasher.update(tx_id.0.as_bytes());
    hasher.update(now.to_le_bytes());
    hasher.update(&body);
    Ok(hasher.finalize().into())
}
