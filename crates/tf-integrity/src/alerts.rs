//! # Alert Sink
//!
//! Persists integrity alerts and forwards them to the external notification
//! channel. Recording is deduplicated — at most one unresolved alert per
//! (document, outcome) — and notification is best-effort: a delivery
//! failure is logged and the alert stays marked un-notified for
//! out-of-band retry; it never fails or rolls back the record.

use crate::domain::errors::AlertError;
use crate::domain::outcome::{Alert, AlertSummary, IntegrityOutcome, Severity};
use crate::ports::outbound::NotificationChannel;
use parking_lot::RwLock;
use shared_types::{Actor, AlertId, DocumentId, TimeSource};
use std::sync::Arc;

/// Alert sink configuration.
#[derive(Debug, Clone, Default)]
pub struct AlertSinkConfig {
    /// Recipients for forwarded alert summaries. With no recipients
    /// configured, alerts are recorded but nothing is forwarded.
    pub recipients: Vec<String>,
}

/// Persistent store of integrity alerts.
pub struct AlertSink {
    clock: Arc<dyn TimeSource>,
    notifier: Arc<dyn NotificationChannel>,
    config: AlertSinkConfig,
    alerts: RwLock<Vec<Alert>>,
}

impl AlertSink {
    pub fn new(
        clock: Arc<dyn TimeSource>,
        notifier: Arc<dyn NotificationChannel>,
        config: AlertSinkConfig,
    ) -> Self {
        Self {
            clock,
            notifier,
            config,
            alerts: RwLock::new(Vec::new()),
        }
    }

    /// Record an alert unless an unresolved one already exists for the same
    /// (document, outcome). Returns `None` on dedupe.
    pub fn record_if_new(
        &self,
        document_id: DocumentId,
        outcome: IntegrityOutcome,
        severity: Severity,
        detail: impl Into<String>,
    ) -> Option<Alert> {
        let mut alerts = self.alerts.write();
        let duplicate = alerts
            .iter()
            .any(|a| a.document_id == document_id && a.outcome == outcome && !a.resolved);
        if duplicate {
            tracing::debug!(
                "[tf-integrity] open {} alert already exists for document {}, not re-alerting",
                outcome,
                document_id
            );
            return None;
        }

        let alert = Alert {
            id: AlertId::new(),
            document_id,
            outcome,
            severity,
            detail: detail.into(),
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            notified: false,
            created_at: self.clock.now(),
        };
        alerts.push(alert.clone());
        tracing::warn!(
            "[tf-integrity] {} alert ({}) recorded for document {}",
            alert.outcome,
            alert.severity,
            alert.document_id
        );
        Some(alert)
    }

    /// Resolve an alert. Fails with `AlreadyResolved` on a second call and
    /// `NotFound` for an unknown id.
    pub fn resolve(&self, alert_id: AlertId, resolver: &Actor) -> Result<Alert, AlertError> {
        let mut alerts = self.alerts.write();
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or(AlertError::NotFound(alert_id))?;
        if alert.resolved {
            return Err(AlertError::AlreadyResolved(alert_id));
        }
        alert.resolved = true;
        alert.resolved_by = Some(resolver.id);
        alert.resolved_at = Some(self.clock.now());
        tracing::info!(
            "[tf-integrity] alert {} resolved by {} ({})",
            alert_id,
            resolver.id,
            resolver.role
        );
        Ok(alert.clone())
    }

    /// Forward an alert to the external channel, best-effort. Marks the
    /// alert notified on success; on failure logs and leaves it un-notified.
    pub async fn notify(&self, alert: &Alert, doc_number: &str) {
        if self.config.recipients.is_empty() {
            tracing::info!(
                "[tf-integrity] no alert recipients configured; alert {} recorded only",
                alert.id
            );
            return;
        }

        let summary = AlertSummary {
            subject: format!(
                "Integrity {}: document {} ({})",
                alert.outcome, doc_number, alert.severity
            ),
            body: alert.detail.clone(),
            recipients: self.config.recipients.clone(),
        };

        match self.notifier.send(&summary).await {
            Ok(()) => {
                if let Some(stored) = self
                    .alerts
                    .write()
                    .iter_mut()
                    .find(|a| a.id == alert.id)
                {
                    stored.notified = true;
                }
            }
            Err(e) => {
                // Out-of-band retry picks up un-notified alerts later.
                tracing::warn!(
                    "[tf-integrity] failed to forward alert {}: {}",
                    alert.id,
                    e
                );
            }
        }
    }

    /// All unresolved alerts.
    pub fn open_alerts(&self) -> Vec<Alert> {
        self.alerts
            .read()
            .iter()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    /// All alerts for a document, open or resolved.
    pub fn alerts_for(&self, document_id: DocumentId) -> Vec<Alert> {
        self.alerts
            .read()
            .iter()
            .filter(|a| a.document_id == document_id)
            .cloned()
            .collect()
    }

    /// Recorded alerts that have not yet been delivered externally.
    pub fn unnotified_alerts(&self) -> Vec<Alert> {
        self.alerts
            .read()
            .iter()
            .filter(|a| !a.notified)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::NotifyError;
    use async_trait::async_trait;
    use shared_types::time::FixedTimeSource;
    use shared_types::{ActorId, Role};

    struct FailingNotifier;

    #[async_trait]
    impl NotificationChannel for FailingNotifier {
        async fn send(&self, _summary: &AlertSummary) -> Result<(), NotifyError> {
            Err(NotifyError {
                message: "smtp down".to_string(),
            })
        }
    }

    fn sink_with(notifier: Arc<dyn NotificationChannel>, recipients: Vec<String>) -> AlertSink {
        AlertSink::new(
            Arc::new(FixedTimeSource::new(1_700_000_000)),
            notifier,
            AlertSinkConfig { recipients },
        )
    }

    fn sink() -> AlertSink {
        sink_with(
            Arc::new(crate::ports::outbound::LoggingNotifier),
            vec!["audit@example.com".to_string()],
        )
    }

    #[test]
    fn dedupes_open_alerts_per_document_and_outcome() {
        let sink = sink();
        let doc = DocumentId::new();

        let first = sink
            .record_if_new(doc, IntegrityOutcome::HashMismatch, Severity::Critical, "d1")
            .unwrap();
        assert!(sink
            .record_if_new(doc, IntegrityOutcome::HashMismatch, Severity::Critical, "d2")
            .is_none());
        // A different outcome for the same document is not a duplicate.
        assert!(sink
            .record_if_new(doc, IntegrityOutcome::FileMissing, Severity::High, "d3")
            .is_some());
        assert_eq!(sink.open_alerts().len(), 2);

        // Once resolved, the condition may alert again.
        let resolver = Actor::new(ActorId::new(), Role::Admin, "ops");
        sink.resolve(first.id, &resolver).unwrap();
        assert!(sink
            .record_if_new(doc, IntegrityOutcome::HashMismatch, Severity::Critical, "d4")
            .is_some());
    }

    #[test]
    fn resolve_is_not_idempotent() {
        let sink = sink();
        let doc = DocumentId::new();
        let alert = sink
            .record_if_new(doc, IntegrityOutcome::FileMissing, Severity::High, "gone")
            .unwrap();
        let resolver = Actor::new(ActorId::new(), Role::Auditor, "global-audit");

        let resolved = sink.resolve(alert.id, &resolver).unwrap();
        assert!(resolved.resolved);
        assert_eq!(resolved.resolved_by, Some(resolver.id));
        assert!(resolved.resolved_at.is_some());

        assert!(matches!(
            sink.resolve(alert.id, &resolver),
            Err(AlertError::AlreadyResolved(id)) if id == alert.id
        ));
        let unknown = AlertId::new();
        assert!(matches!(
            sink.resolve(unknown, &resolver),
            Err(AlertError::NotFound(id)) if id == unknown
        ));
    }

    #[tokio::test]
    async fn notify_failure_leaves_alert_recorded_and_unnotified() {
        let sink = sink_with(
            Arc::new(FailingNotifier),
            vec!["audit@example.com".to_string()],
        );
        let doc = DocumentId::new();
        let alert = sink
            .record_if_new(doc, IntegrityOutcome::HashMismatch, Severity::Critical, "x")
            .unwrap();

        sink.notify(&alert, "INV-1").await;

        let stored = &sink.alerts_for(doc)[0];
        assert!(!stored.notified);
        assert_eq!(sink.unnotified_alerts().len(), 1);
    }

    #[tokio::test]
    async fn notify_success_marks_alert() {
        let sink = sink();
        let doc = DocumentId::new();
        let alert = sink
            .record_if_new(doc, IntegrityOutcome::FileMissing, Severity::High, "x")
            .unwrap();

        sink.notify(&alert, "BOL-7").await;
        assert!(sink.alerts_for(doc)[0].notified);
        assert!(sink.unnotified_alerts().is_empty());
    }
}
