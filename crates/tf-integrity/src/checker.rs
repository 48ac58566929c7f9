//! # Integrity Checker
//!
//! Recomputes content digests and compares them against the digest recorded
//! at upload time. Runs per document on demand, incrementally from a
//! watermark, or as a full sweep.
//!
//! Each check is independent: one document failing never aborts a batch.
//! Transiently unavailable storage is retried before the document is
//! recorded as missing; genuinely absent content is recorded immediately.

use crate::alerts::AlertSink;
use crate::domain::errors::{IntegrityError, StorageError};
use crate::domain::outcome::{IntegrityCheckResult, IntegrityOutcome, SweepReport};
use crate::hashing::ContentHasher;
use crate::ports::outbound::{DocumentDirectory, DocumentSnapshot, StorageBackend};
use parking_lot::RwLock;
use shared_types::{Actor, CheckResultId, DocumentId, TimeSource, Timestamp};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tf_ledger::{LedgerAction, LedgerStore, Metadata, NewLedgerEntry};

/// Integrity checker configuration.
#[derive(Debug, Clone)]
pub struct IntegrityConfig {
    /// Reads retried on `Unavailable` before the content counts as missing.
    pub read_retries: u32,
    /// Fixed delay between retries.
    pub retry_backoff: Duration,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            read_retries: 3,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

/// Cooperative cancellation flag for full sweeps.
///
/// A sweep observes the flag between documents, so cancelling never leaves
/// a partially-written result row — everything already recorded stays.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct CheckerState {
    results: Vec<IntegrityCheckResult>,
    /// How far incremental sweeps have progressed.
    watermark: Timestamp,
}

/// The integrity verification service.
pub struct IntegrityChecker {
    hasher: Arc<dyn ContentHasher>,
    storage: Arc<dyn StorageBackend>,
    directory: Arc<dyn DocumentDirectory>,
    ledger: Arc<dyn LedgerStore>,
    alerts: Arc<AlertSink>,
    clock: Arc<dyn TimeSource>,
    config: IntegrityConfig,
    state: RwLock<CheckerState>,
}

impl IntegrityChecker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hasher: Arc<dyn ContentHasher>,
        storage: Arc<dyn StorageBackend>,
        directory: Arc<dyn DocumentDirectory>,
        ledger: Arc<dyn LedgerStore>,
        alerts: Arc<AlertSink>,
        clock: Arc<dyn TimeSource>,
        config: IntegrityConfig,
    ) -> Self {
        Self {
            hasher,
            storage,
            directory,
            ledger,
            alerts,
            clock,
            config,
            state: RwLock::new(CheckerState {
                results: Vec::new(),
                watermark: 0,
            }),
        }
    }

    /// The alert sink this checker records into.
    pub fn alert_sink(&self) -> &Arc<AlertSink> {
        &self.alerts
    }

    // =========================================================================
    // Single-document check
    // =========================================================================

    /// On-demand check of one document.
    ///
    /// Never panics on missing content: an unlocatable file is a
    /// `FileMissing` result, not an error. The only error is an unknown
    /// document id.
    pub async fn check_one(
        &self,
        document_id: DocumentId,
    ) -> Result<IntegrityCheckResult, IntegrityError> {
        let snapshot = self
            .directory
            .snapshot(document_id)
            .ok_or(IntegrityError::UnknownDocument(document_id))?;
        Ok(self.check_snapshot(&snapshot).await)
    }

    /// Check one snapshot: recompute, compare, record, and alert on
    /// non-OK outcomes.
    async fn check_snapshot(&self, snapshot: &DocumentSnapshot) -> IntegrityCheckResult {
        let (outcome, recomputed, detail) = match &snapshot.content_location {
            None => (
                IntegrityOutcome::Ok,
                None,
                Some("metadata-only document; no stored content".to_string()),
            ),
            Some(location) => match self.read_with_retry(location).await {
                Ok(bytes) => {
                    let recomputed = self.hasher.digest(&bytes);
                    if recomputed == snapshot.digest {
                        (IntegrityOutcome::Ok, Some(recomputed), None)
                    } else {
                        let detail = format!(
                            "hash mismatch for {} {}: stored {}, recomputed {}",
                            snapshot.doc_type, snapshot.doc_number, snapshot.digest, recomputed
                        );
                        (IntegrityOutcome::HashMismatch, Some(recomputed), Some(detail))
                    }
                }
                Err(StorageError::NotFound) => (
                    IntegrityOutcome::FileMissing,
                    None,
                    Some(format!("content not found at {}", location)),
                ),
                Err(StorageError::Unavailable { message }) => (
                    IntegrityOutcome::FileMissing,
                    None,
                    Some(format!(
                        "storage unavailable after {} attempts: {}",
                        self.config.read_retries + 1,
                        message
                    )),
                ),
            },
        };

        let mut result = IntegrityCheckResult {
            id: CheckResultId::new(),
            document_id: snapshot.id,
            outcome,
            recorded_digest: snapshot.digest.clone(),
            recomputed_digest: recomputed,
            detail,
            checked_at: self.clock.now(),
            alerted: false,
        };

        if outcome != IntegrityOutcome::Ok {
            result.alerted = self.raise_alert(snapshot, &result).await;
            tracing::warn!(
                "[tf-integrity] {} for {} {}: {}",
                outcome,
                snapshot.doc_type,
                snapshot.doc_number,
                result.detail.as_deref().unwrap_or_default()
            );
        }

        self.state.write().results.push(result.clone());
        result
    }

    /// Read content, retrying transient unavailability up to the configured
    /// budget. `NotFound` is terminal immediately.
    async fn read_with_retry(
        &self,
        location: &shared_types::ContentLocation,
    ) -> Result<Vec<u8>, StorageError> {
        let mut last = None;
        for attempt in 0..=self.config.read_retries {
            match self.storage.read_bytes(location).await {
                Ok(bytes) => return Ok(bytes),
                Err(StorageError::NotFound) => return Err(StorageError::NotFound),
                Err(err @ StorageError::Unavailable { .. }) => {
                    tracing::debug!(
                        "[tf-integrity] read attempt {} failed for {}: {}",
                        attempt + 1,
                        location,
                        err
                    );
                    last = Some(err);
                    if attempt < self.config.read_retries {
                        tokio::time::sleep(self.config.retry_backoff).await;
                    }
                }
            }
        }
        Err(last.unwrap_or(StorageError::NotFound))
    }

    /// Record an alert (deduplicated), append the `IntegrityAlert` ledger
    /// entry, and forward the notification. Returns whether a new alert was
    /// created.
    async fn raise_alert(&self, snapshot: &DocumentSnapshot, result: &IntegrityCheckResult) -> bool {
        let Some(severity) = result.outcome.severity() else {
            return false;
        };
        let Some(alert) = self.alerts.record_if_new(
            snapshot.id,
            result.outcome,
            severity,
            result.detail.clone().unwrap_or_default(),
        ) else {
            return false;
        };

        let mut metadata = Metadata::new();
        metadata.insert("outcome".into(), serde_json::json!(result.outcome.to_string()));
        metadata.insert("alert_id".into(), serde_json::json!(alert.id.to_string()));
        metadata.insert(
            "recorded_digest".into(),
            serde_json::json!(result.recorded_digest.as_str()),
        );
        if let Some(recomputed) = &result.recomputed_digest {
            metadata.insert("recomputed_digest".into(), serde_json::json!(recomputed.as_str()));
        }

        let entry = NewLedgerEntry::new(
            snapshot.id,
            LedgerAction::IntegrityAlert,
            &Actor::system(),
            result.checked_at,
        )
        .with_metadata(metadata);
        if let Err(e) = self.ledger.append(entry) {
            // The alert itself is already recorded; only the audit entry
            // is lost, so surface loudly instead of failing the check.
            tracing::error!(
                "[tf-integrity] failed to append integrity-alert entry for {}: {}",
                snapshot.id,
                e
            );
        }

        self.alerts.notify(&alert, &snapshot.doc_number).await;
        true
    }

    // =========================================================================
    // Sweeps
    // =========================================================================

    /// Check documents created at or after `since` (the frequent cadence).
    /// Advances the stored watermark to this run's start time.
    pub async fn check_incremental(&self, since: Timestamp) -> SweepReport {
        let started_at = self.clock.now();
        let snapshots = self.directory.created_since(since);
        tracing::info!(
            "[tf-integrity] incremental check: {} documents since {}",
            snapshots.len(),
            since
        );

        let report = self.run_sweep(snapshots, started_at, None).await;
        self.state.write().watermark = started_at;
        report
    }

    /// Check every document (the rare full sweep). May be interrupted
    /// between documents via `cancel`; results already written stay.
    pub async fn check_full(&self, cancel: &CancelFlag) -> SweepReport {
        let started_at = self.clock.now();
        let snapshots = self.directory.all();
        tracing::info!(
            "[tf-integrity] full sweep: {} documents",
            snapshots.len()
        );
        self.run_sweep(snapshots, started_at, Some(cancel)).await
    }

    async fn run_sweep(
        &self,
        snapshots: Vec<DocumentSnapshot>,
        started_at: Timestamp,
        cancel: Option<&CancelFlag>,
    ) -> SweepReport {
        let mut report = SweepReport {
            started_at,
            ..SweepReport::default()
        };

        for snapshot in snapshots {
            if let Some(cancel) = cancel {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    tracing::info!(
                        "[tf-integrity] sweep cancelled after {} documents",
                        report.checked
                    );
                    break;
                }
            }

            // Re-resolve through the directory: the snapshot list was taken
            // at sweep start and the document may have changed since.
            match self.directory.snapshot(snapshot.id) {
                Some(current) => {
                    let result = self.check_snapshot(&current).await;
                    report.absorb(&result);
                }
                None => {
                    report
                        .failures
                        .push((snapshot.id, "document disappeared during sweep".to_string()));
                }
            }
        }

        report.finished_at = self.clock.now();
        tracing::info!(
            "[tf-integrity] sweep complete: {} checked, {} ok, {} mismatch, {} missing, {} alerts",
            report.checked,
            report.ok,
            report.mismatch,
            report.missing,
            report.alerts_created
        );
        report
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// All recorded results for a document, oldest first.
    pub fn results_for(&self, document_id: DocumentId) -> Vec<IntegrityCheckResult> {
        self.state
            .read()
            .results
            .iter()
            .filter(|r| r.document_id == document_id)
            .cloned()
            .collect()
    }

    /// Where the next incremental sweep picks up.
    pub fn latest_watermark(&self) -> Timestamp {
        self.state.read().watermark
    }
}
