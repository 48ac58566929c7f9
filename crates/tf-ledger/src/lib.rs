//! # Ledger Store (tf-ledger)
//!
//! The Ledger Store is the authoritative, append-only record of every
//! accepted document transition and every integrity check outcome.
//!
//! ## Domain Invariants
//!
//! | # | Invariant | Description |
//! |---|-----------|-------------|
//! | 1 | Append-Only | No update or delete exists in the public contract |
//! | 2 | Total Order | Entries for a document are ordered by timestamp, ties broken by a monotonic sequence number |
//! | 3 | Durability Errors Propagate | A failed append is returned to the caller, never swallowed |
//!
//! Corrections are modeled as new entries (e.g. `Amended`), never as edits
//! to history.
//!
//! ## Usage
//!
//! ```ignore
//! use tf_ledger::{InMemoryLedgerStore, LedgerStore, NewLedgerEntry};
//!
//! let store = InMemoryLedgerStore::new();
//! let entry = store.append(NewLedgerEntry::new(doc_id, LedgerAction::Issued, &actor, now))?;
//! let history = store.entries_for(doc_id);
//! ```

pub mod domain;
pub mod store;

pub use domain::entry::{LedgerAction, LedgerEntry, Metadata, NewLedgerEntry};
pub use domain::errors::LedgerError;
pub use store::file::FileBackedLedgerStore;
pub use store::memory::InMemoryLedgerStore;
pub use store::LedgerStore;
