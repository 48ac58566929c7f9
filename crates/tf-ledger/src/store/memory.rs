//! In-memory ledger store for unit tests and development.
//!
//! Production deployments use [`crate::FileBackedLedgerStore`] or a
//! database-backed implementation of the same trait.

use crate::domain::entry::{LedgerEntry, NewLedgerEntry};
use crate::domain::errors::LedgerError;
use crate::store::LedgerStore;
use parking_lot::RwLock;
use shared_types::{DocumentId, LedgerEntryId, Timestamp};

#[derive(Default)]
struct LedgerState {
    entries: Vec<LedgerEntry>,
    next_seq: u64,
}

/// In-memory append-only ledger.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn seal(entry: NewLedgerEntry, seq: u64) -> LedgerEntry {
    LedgerEntry {
        id: LedgerEntryId::new(),
        seq,
        document_id: entry.document_id,
        action: entry.action,
        actor_id: entry.actor_id,
        actor_role: entry.actor_role,
        transaction_id: entry.transaction_id,
        timestamp: entry.timestamp,
        metadata: entry.metadata,
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.state.write();
        let seq = state.next_seq;
        state.next_seq += 1;
        let sealed = seal(entry, seq);
        state.entries.push(sealed.clone());
        Ok(sealed)
    }

    fn entries_for(&self, document_id: DocumentId) -> Vec<LedgerEntry> {
        let state = self.state.read();
        let mut entries: Vec<_> = state
            .entries
            .iter()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect();
        entries.sort_by_key(LedgerEntry::order_key);
        entries
    }

    fn entries_in_window(&self, since: Timestamp, until: Timestamp) -> Vec<LedgerEntry> {
        let state = self.state.read();
        let mut entries: Vec<_> = state
            .entries
            .iter()
            .filter(|e| e.timestamp >= since && e.timestamp < until)
            .cloned()
            .collect();
        entries.sort_by_key(LedgerEntry::order_key);
        entries
    }

    fn len(&self) -> usize {
        self.state.read().entries.len()
    }
}
