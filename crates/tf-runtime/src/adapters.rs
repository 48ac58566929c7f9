//! # Port Adapters
//!
//! Host-side implementations of subsystem ports, connecting the integrity
//! checker to the live lifecycle service.

use shared_types::{DocumentId, Timestamp};
use std::sync::Arc;
use tf_integrity::{DocumentDirectory, DocumentSnapshot};
use tf_lifecycle::LifecycleService;

/// [`DocumentDirectory`] over the lifecycle service's snapshot accessors.
///
/// Each snapshot is taken under that document's own lock only, so checks
/// never contend with transitions on other documents.
pub struct LifecycleDirectory {
    lifecycle: Arc<LifecycleService>,
}

impl LifecycleDirectory {
    pub fn new(lifecycle: Arc<LifecycleService>) -> Self {
        Self { lifecycle }
    }
}

impl DocumentDirectory for LifecycleDirectory {
    fn snapshot(&self, id: DocumentId) -> Option<DocumentSnapshot> {
        self.lifecycle.document(id).map(DocumentSnapshot::from)
    }

    fn created_since(&self, since: Timestamp) -> Vec<DocumentSnapshot> {
        self.lifecycle
            .documents_created_since(since)
            .into_iter()
            .map(DocumentSnapshot::from)
            .collect()
    }

    fn all(&self) -> Vec<DocumentSnapshot> {
        self.lifecycle
            .all_documents()
            .into_iter()
            .map(DocumentSnapshot::from)
            .collect()
    }
}
