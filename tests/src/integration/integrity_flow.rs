//! Tamper and missing-file detection across the live lifecycle service,
//! ledger, alert sink, and notification channel.

#![cfg(test)]

use super::helpers::*;
use shared_types::{DocStatus, DocType};
use std::time::Duration;
use tf_integrity::{
    CancelFlag, IntegrityOutcome, IntegrityScheduler, SchedulerConfig, Severity,
};
use tf_ledger::{LedgerAction, LedgerStore, Metadata};
use tf_lifecycle::NewDocument;

fn uploaded_invoice(stack: &Stack, number: &str, content: &[u8]) -> shared_types::Document {
    let (location, digest) = upload_content(stack, number, content);
    stack
        .lifecycle
        .create_document(
            NewDocument {
                doc_type: DocType::Invoice,
                doc_number: number.into(),
                counterparty: None,
                digest,
                content_location: Some(location),
                transaction_id: None,
            },
            &seller(),
            Metadata::new(),
        )
        .unwrap()
}

#[tokio::test]
async fn tamper_detect_dedupe_resolve_cycle() {
    let stack = stack();
    let doc = uploaded_invoice(&stack, "INV-T1", b"original invoice");

    // Healthy first.
    let result = stack.checker.check_one(doc.id).await.unwrap();
    assert_eq!(result.outcome, IntegrityOutcome::Ok);

    // Tamper with the stored content.
    let location = doc.content_location.clone().unwrap();
    stack.storage.put(location, b"forged invoice".to_vec());

    let result = stack.checker.check_one(doc.id).await.unwrap();
    assert_eq!(result.outcome, IntegrityOutcome::HashMismatch);
    assert_eq!(result.recorded_digest, doc.digest);
    assert_ne!(result.recomputed_digest.as_ref(), Some(&doc.digest));

    // One open critical alert, one notification, one ledger audit entry.
    let open = stack.checker.alert_sink().open_alerts();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].severity, Severity::Critical);
    assert_eq!(stack.notifier.sent.lock().len(), 1);
    let audit_entries: Vec<_> = stack
        .ledger
        .entries_for(doc.id)
        .into_iter()
        .filter(|e| e.action == LedgerAction::IntegrityAlert)
        .collect();
    assert_eq!(audit_entries.len(), 1);

    // The alert does not move the document and history still replays.
    assert_eq!(stack.lifecycle.document(doc.id).unwrap().status, DocStatus::Issued);
    stack.lifecycle.verify_history(doc.id).unwrap();

    // Re-checking while unresolved records a result but no new alert.
    stack.checker.check_one(doc.id).await.unwrap();
    assert_eq!(stack.checker.alert_sink().open_alerts().len(), 1);
    assert_eq!(stack.notifier.sent.lock().len(), 1);
    assert_eq!(stack.checker.results_for(doc.id).len(), 3);

    // After resolution the still-broken content alerts again.
    let admin = shared_types::Actor::new(shared_types::ActorId::new(), shared_types::Role::Admin, "ops");
    stack
        .checker
        .alert_sink()
        .resolve(open[0].id, &admin)
        .unwrap();
    stack.checker.check_one(doc.id).await.unwrap();
    assert_eq!(stack.checker.alert_sink().open_alerts().len(), 1);
    assert_eq!(stack.notifier.sent.lock().len(), 2);
}

#[tokio::test]
async fn missing_file_alerts_high_and_never_panics() {
    let stack = stack();
    let doc = uploaded_invoice(&stack, "INV-T2", b"body");
    stack.storage.remove(doc.content_location.as_ref().unwrap());

    let result = stack.checker.check_one(doc.id).await.unwrap();
    assert_eq!(result.outcome, IntegrityOutcome::FileMissing);
    assert!(result.recomputed_digest.is_none());

    let open = stack.checker.alert_sink().open_alerts();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].severity, Severity::High);
}

#[tokio::test]
async fn full_sweep_covers_all_documents_and_cancellation_keeps_results() {
    let stack = stack();
    let content: Vec<u8> = (0..512).map(|_| rand::random::<u8>()).collect();
    uploaded_invoice(&stack, "INV-A", &content);
    let bad = uploaded_invoice(&stack, "INV-B", b"b");
    stack.storage.remove(bad.content_location.as_ref().unwrap());

    let report = stack.checker.check_full(&CancelFlag::new()).await;
    assert_eq!(report.checked, 2);
    assert_eq!(report.ok, 1);
    assert_eq!(report.missing, 1);
    assert_eq!(report.alerts_created, 1);

    // A cancelled sweep stops between documents; earlier results stay.
    let cancel = CancelFlag::new();
    cancel.cancel();
    let cancelled = stack.checker.check_full(&cancel).await;
    assert!(cancelled.cancelled);
    assert_eq!(cancelled.checked, 0);
    assert!(!stack.checker.results_for(bad.id).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn scheduled_incremental_check_raises_alert_for_tampered_upload() {
    let stack = stack();
    let doc = uploaded_invoice(&stack, "INV-S1", b"scheduled body");
    stack
        .storage
        .put(doc.content_location.clone().unwrap(), b"tampered".to_vec());

    let scheduler = IntegrityScheduler::spawn(
        stack.checker.clone(),
        SchedulerConfig {
            incremental_every: Duration::from_millis(20),
            full_every: Duration::from_secs(3_600),
        },
    );

    // Poll for the background loop to pick the document up.
    let mut alerted = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if !stack.checker.alert_sink().open_alerts().is_empty() {
            alerted = true;
            break;
        }
    }
    scheduler.shutdown();

    assert!(alerted, "scheduled check never raised the alert");
    assert_eq!(
        stack.checker.alert_sink().open_alerts()[0].outcome,
        IntegrityOutcome::HashMismatch
    );
}
