//! # Ledger Store Contract
//!
//! The public contract deliberately has no update or delete operation:
//! history is corrected by appending (e.g. an `Amended` entry), never by
//! editing.

use crate::domain::entry::{LedgerEntry, NewLedgerEntry};
use crate::domain::errors::LedgerError;
use shared_types::{DocumentId, Timestamp};

pub mod file;
pub mod memory;

/// Append-only ledger store.
///
/// Safe for concurrent writers across documents; within one document the
/// caller (the lifecycle service) serializes appends with the transition
/// that produced them.
pub trait LedgerStore: Send + Sync {
    /// Append an entry, assigning its id and monotonic sequence number.
    ///
    /// Fails only on durability/storage error, which is propagated.
    fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError>;

    /// All entries for a document, timestamp ascending with the sequence
    /// number breaking ties.
    fn entries_for(&self, document_id: DocumentId) -> Vec<LedgerEntry>;

    /// All entries with `since <= timestamp < until`, in global order.
    /// Used by periodic/audit queries.
    fn entries_in_window(&self, since: Timestamp, until: Timestamp) -> Vec<LedgerEntry>;

    /// Total number of entries.
    fn len(&self) -> usize;

    /// True when the ledger holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
