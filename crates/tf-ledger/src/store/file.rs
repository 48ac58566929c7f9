//! File-backed ledger store.
//!
//! Persists entries to a length-prefixed binary log on disk, providing
//! durability without requiring a database. Suitable for development and
//! light production.
//!
//! Record format: `[len: u32 LE][bincode(LedgerEntry)]...` — appended
//! records are flushed with `sync_all` before the append returns, so a
//! reported success is durable.

use crate::domain::entry::{LedgerEntry, NewLedgerEntry};
use crate::domain::errors::LedgerError;
use crate::store::memory::seal;
use crate::store::LedgerStore;
use parking_lot::Mutex;
use shared_types::{DocumentId, Timestamp};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

struct FileLedgerState {
    entries: Vec<LedgerEntry>,
    next_seq: u64,
    file: File,
}

/// Append-only ledger persisted to a binary log file.
pub struct FileBackedLedgerStore {
    path: PathBuf,
    state: Mutex<FileLedgerState>,
}

impl FileBackedLedgerStore {
    /// Open (or create) the log at `path`, replaying existing records.
    ///
    /// A truncated trailing record (e.g. after a crash mid-append) is
    /// dropped; everything before it is kept.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(LedgerError::io)?;
        }

        let entries = Self::load_from_file(&path)?;
        if entries.is_empty() {
            tracing::info!("[tf-ledger] starting empty ledger log at {}", path.display());
        } else {
            tracing::info!(
                "[tf-ledger] replayed {} entries from {}",
                entries.len(),
                path.display()
            );
        }

        let next_seq = entries.last().map(|e| e.seq + 1).unwrap_or(0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(LedgerError::io)?;

        Ok(Self {
            path,
            state: Mutex::new(FileLedgerState {
                entries,
                next_seq,
                file,
            }),
        })
    }

    /// Path of the backing log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(path: &Path) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut bytes = Vec::new();
        match File::open(path) {
            Ok(mut file) => {
                file.read_to_end(&mut bytes).map_err(LedgerError::io)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LedgerError::io(e)),
        }

        let mut entries = Vec::new();
        let mut cursor = 0usize;
        while cursor + 4 <= bytes.len() {
            let len_bytes: [u8; 4] = bytes[cursor..cursor + 4]
                .try_into()
                .map_err(LedgerError::serialization)?;
            let len = u32::from_le_bytes(len_bytes) as usize;
            cursor += 4;

            if cursor + len > bytes.len() {
                // Truncated trailing record: keep what replayed cleanly.
                tracing::warn!(
                    "[tf-ledger] dropping truncated trailing record in {}",
                    path.display()
                );
                break;
            }
            let entry: LedgerEntry = bincode::deserialize(&bytes[cursor..cursor + len])
                .map_err(LedgerError::serialization)?;
            cursor += len;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn write_record(file: &mut File, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let encoded = bincode::serialize(entry).map_err(LedgerError::serialization)?;
        let mut record = Vec::with_capacity(4 + encoded.len());
        record.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        record.extend_from_slice(&encoded);

        file.write_all(&record).map_err(LedgerError::io)?;
        file.sync_all().map_err(LedgerError::io)?;
        Ok(())
    }
}

impl LedgerStore for FileBackedLedgerStore {
    fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        let sealed = seal(entry, seq);

        // Durability first: only advance in-memory state once the record
        // is on disk, so a failed write is not observable as an append.
        Self::write_record(&mut state.file, &sealed)?;
        state.next_seq += 1;
        state.entries.push(sealed.clone());
        Ok(sealed)
    }

    fn entries_for(&self, document_id: DocumentId) -> Vec<LedgerEntry> {
        let state = self.state.lock();
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
        let state = self.state.lock();
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
        self.state.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::LedgerAction;
    use shared_types::{Actor, ActorId, Role};

    fn actor() -> Actor {
        Actor::new(ActorId::new(), Role::Seller, "pacific-exports")
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        let doc = DocumentId::new();
        let a = actor();

        {
            let store = FileBackedLedgerStore::open(&path).unwrap();
            store
                .append(NewLedgerEntry::new(doc, LedgerAction::Issued, &a, 10))
                .unwrap();
            store
                .append(NewLedgerEntry::new(doc, LedgerAction::Shipped, &a, 20))
                .unwrap();
        }

        let reopened = FileBackedLedgerStore::open(&path).unwrap();
        let entries = reopened.entries_for(doc);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, LedgerAction::Issued);
        assert_eq!(entries[1].action, LedgerAction::Shipped);
        // Sequence numbering continues after replay.
        let next = reopened
            .append(NewLedgerEntry::new(doc, LedgerAction::Received, &a, 30))
            .unwrap();
        assert_eq!(next.seq, 2);
    }

    #[test]
    fn truncated_tail_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        let doc = DocumentId::new();
        let a = actor();

        {
            let store = FileBackedLedgerStore::open(&path).unwrap();
            store
                .append(NewLedgerEntry::new(doc, LedgerAction::Issued, &a, 10))
                .unwrap();
        }

        // Simulate a crash mid-append: a length prefix with no body.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&999u32.to_le_bytes()).unwrap();
        }

        let reopened = FileBackedLedgerStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn metadata_round_trips_through_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        let doc = DocumentId::new();
        let a = actor();

        let mut metadata = crate::domain::entry::Metadata::new();
        metadata.insert("amount".into(), serde_json::json!(125_000.5));
        metadata.insert("tracking_id".into(), serde_json::json!("TRK-99"));

        {
            let store = FileBackedLedgerStore::open(&path).unwrap();
            store
                .append(
                    NewLedgerEntry::new(doc, LedgerAction::Shipped, &a, 10)
                        .with_metadata(metadata.clone()),
                )
                .unwrap();
        }

        let reopened = FileBackedLedgerStore::open(&path).unwrap();
        assert_eq!(reopened.entries_for(doc)[0].metadata, metadata);
    }

    #[test]
    fn open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/ledger.bin");
        let store = FileBackedLedgerStore::open(&path).unwrap();
        assert!(store.is_empty());
    }
}
