//! Full-stack fixture: lifecycle service, ledger, storage, integrity
//! checker, and a recording notification channel.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Actor, ActorId, ContentLocation, Role, SystemTimeSource};
use std::sync::Arc;
use tf_integrity::{
    AlertSink, AlertSinkConfig, AlertSummary, ContentHasher, IntegrityChecker, IntegrityConfig,
    NotificationChannel, NotifyError, InMemoryStorageBackend, Sha256Hasher,
};
use tf_ledger::{InMemoryLedgerStore, LedgerStore};
use tf_lifecycle::{LifecycleConfig, LifecycleService, TransitionTable};
use tf_runtime::LifecycleDirectory;

/// Notification channel that records every summary it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<AlertSummary>>,
}

#[async_trait]
impl NotificationChannel for RecordingNotifier {
    async fn send(&self, summary: &AlertSummary) -> Result<(), NotifyError> {
        self.sent.lock().push(summary.clone());
        Ok(())
    }
}

/// Everything wired together the way the runtime wires it.
pub struct Stack {
    pub lifecycle: Arc<LifecycleService>,
    pub checker: Arc<IntegrityChecker>,
    pub storage: Arc<InMemoryStorageBackend>,
    pub ledger: Arc<InMemoryLedgerStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn stack() -> Stack {
    stack_with(LifecycleConfig::default())
}

pub fn stack_with(config: LifecycleConfig) -> Stack {
    let ledger = Arc::new(InMemoryLedgerStore::new());
    let clock = Arc::new(SystemTimeSource);
    let lifecycle = Arc::new(LifecycleService::new(
        TransitionTable::default_rules().expect("default table validates"),
        ledger.clone() as Arc<dyn LedgerStore>,
        clock.clone(),
        config,
    ));

    let storage = Arc::new(InMemoryStorageBackend::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let alerts = Arc::new(AlertSink::new(
        clock.clone(),
        notifier.clone(),
        AlertSinkConfig {
            recipients: vec!["compliance@example.com".to_string()],
        },
    ));
    let checker = Arc::new(IntegrityChecker::new(
        Arc::new(Sha256Hasher),
        storage.clone(),
        Arc::new(LifecycleDirectory::new(lifecycle.clone())),
        ledger.clone() as Arc<dyn LedgerStore>,
        alerts,
        clock,
        IntegrityConfig {
            read_retries: 1,
            retry_backoff: std::time::Duration::from_millis(1),
        },
    ));

    Stack {
        lifecycle,
        checker,
        storage,
        ledger,
        notifier,
    }
}

pub fn buyer() -> Actor {
    Actor::new(ActorId::new(), Role::Buyer, "acme-imports")
}

pub fn seller() -> Actor {
    Actor::new(ActorId::new(), Role::Seller, "pacific-exports")
}

pub fn bank() -> Actor {
    Actor::new(ActorId::new(), Role::Bank, "first-trade-bank")
}

pub fn auditor() -> Actor {
    Actor::new(ActorId::new(), Role::Auditor, "global-audit")
}

/// Upload content into storage and return (location, digest).
pub fn upload_content(
    stack: &Stack,
    key: &str,
    content: &[u8],
) -> (ContentLocation, shared_types::Digest) {
    let location = ContentLocation::new(format!("local://uploads/{}", key));
    stack.storage.put(location.clone(), content.to_vec());
    (location, Sha256Hasher.digest(content))
}
