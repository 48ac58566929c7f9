//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the integrity subsystem requires the host application to
//! implement: the byte source for stored content, the directory of tracked
//! documents, and the external notification channel.

use crate::domain::errors::{NotifyError, StorageError};
use crate::domain::outcome::AlertSummary;
use async_trait::async_trait;
use shared_types::{ContentLocation, Digest, DocType, Document, DocumentId, Timestamp};

/// Abstract interface to the file storage backend.
///
/// The core does not care whether this is local disk or object storage;
/// `NotFound` means the content genuinely is not there, `Unavailable` means
/// the backend could not answer and the call may be retried.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the full content at `location`.
    async fn read_bytes(&self, location: &ContentLocation) -> Result<Vec<u8>, StorageError>;
}

/// Consistent per-document snapshot used by integrity checks.
///
/// Captured outside any in-flight transition; the digest it carries is the
/// one the check compared against, making a stale comparison
/// self-describing rather than silently wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    pub doc_type: DocType,
    pub doc_number: String,
    pub digest: Digest,
    pub content_location: Option<ContentLocation>,
    pub created_at: Timestamp,
}

impl From<Document> for DocumentSnapshot {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            doc_type: doc.doc_type,
            doc_number: doc.doc_number,
            digest: doc.digest,
            content_location: doc.content_location,
            created_at: doc.created_at,
        }
    }
}

/// Abstract interface to the set of tracked documents.
///
/// Implemented by the host over the lifecycle service; the checker never
/// holds document locks across a batch.
pub trait DocumentDirectory: Send + Sync {
    /// Snapshot one document, if it exists.
    fn snapshot(&self, id: DocumentId) -> Option<DocumentSnapshot>;

    /// Snapshots of documents created at or after `since` (incremental
    /// sweeps).
    fn created_since(&self, since: Timestamp) -> Vec<DocumentSnapshot>;

    /// Snapshots of every document (full sweeps).
    fn all(&self) -> Vec<DocumentSnapshot>;
}

/// Abstract interface to the external notification channel (email or
/// other). Best-effort by contract.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver an alert summary to the recipients.
    async fn send(&self, summary: &AlertSummary) -> Result<(), NotifyError>;
}

// =============================================================================
// ADAPTER IMPLEMENTATIONS
// Production storage/notification adapters live in the host application.
// In-memory implementations below serve unit tests and development.
// =============================================================================

/// In-memory storage backend for unit tests.
///
/// Content can be replaced (tamper simulation), removed (missing file), or
/// marked unavailable for the next N reads (transient outage).
#[derive(Default)]
pub struct InMemoryStorageBackend {
    state: parking_lot::Mutex<InMemoryStorageState>,
}

#[derive(Default)]
struct InMemoryStorageState {
    objects: std::collections::HashMap<ContentLocation, Vec<u8>>,
    unavailable_reads: std::collections::HashMap<ContentLocation, u32>,
}

impl InMemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or overwrite) content at a location.
    pub fn put(&self, location: ContentLocation, bytes: impl Into<Vec<u8>>) {
        self.state.lock().objects.insert(location, bytes.into());
    }

    /// Delete content, so reads return `NotFound`.
    pub fn remove(&self, location: &ContentLocation) {
        self.state.lock().objects.remove(location);
    }

    /// Make the next `reads` reads of a location fail with `Unavailable`.
    pub fn fail_next_reads(&self, location: ContentLocation, reads: u32) {
        self.state.lock().unavailable_reads.insert(location, reads);
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorageBackend {
    async fn read_bytes(&self, location: &ContentLocation) -> Result<Vec<u8>, StorageError> {
        let mut state = self.state.lock();
        if let Some(remaining) = state.unavailable_reads.get_mut(location) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StorageError::Unavailable {
                    message: "simulated outage".to_string(),
                });
            }
        }
        state
            .objects
            .get(location)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

/// Notification channel that only logs. Used when no external channel is
/// configured; delivery always succeeds.
#[derive(Default)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationChannel for LoggingNotifier {
    async fn send(&self, summary: &AlertSummary) -> Result<(), NotifyError> {
        tracing::warn!(
            "[tf-integrity] ALERT {} -> {}: {}",
            summary.subject,
            summary.recipients.join(", "),
            summary.body
        );
        Ok(())
    }
}

/// In-memory directory over a fixed snapshot list, for unit tests. Hosts
/// implement [`DocumentDirectory`] over the live lifecycle service instead.
#[derive(Default)]
pub struct StaticDirectory {
    docs: parking_lot::RwLock<Vec<DocumentSnapshot>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a snapshot.
    pub fn upsert(&self, snapshot: DocumentSnapshot) {
        let mut docs = self.docs.write();
        docs.retain(|d| d.id != snapshot.id);
        docs.push(snapshot);
    }
}

impl DocumentDirectory for StaticDirectory {
    fn snapshot(&self, id: DocumentId) -> Option<DocumentSnapshot> {
        self.docs.read().iter().find(|d| d.id == id).cloned()
    }

    fn created_since(&self, since: Timestamp) -> Vec<DocumentSnapshot> {
        self.docs
            .read()
            .iter()
            .filter(|d| d.created_at >= since)
            .cloned()
            .collect()
    }

    fn all(&self) -> Vec<DocumentSnapshot> {
        self.docs.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(s: &str) -> ContentLocation {
        ContentLocation::new(s)
    }

    #[tokio::test]
    async fn storage_round_trip_and_not_found() {
        let storage = InMemoryStorageBackend::new();
        storage.put(loc("a"), b"bytes".to_vec());

        assert_eq!(storage.read_bytes(&loc("a")).await.unwrap(), b"bytes");
        assert!(matches!(
            storage.read_bytes(&loc("b")).await,
            Err(StorageError::NotFound)
        ));

        storage.remove(&loc("a"));
        assert!(matches!(
            storage.read_bytes(&loc("a")).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn storage_outage_clears_after_budget() {
        let storage = InMemoryStorageBackend::new();
        storage.put(loc("a"), b"bytes".to_vec());
        storage.fail_next_reads(loc("a"), 2);

        for _ in 0..2 {
            assert!(matches!(
                storage.read_bytes(&loc("a")).await,
                Err(StorageError::Unavailable { .. })
            ));
        }
        assert!(storage.read_bytes(&loc("a")).await.is_ok());
    }
}
