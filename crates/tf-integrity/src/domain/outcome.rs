//! # Check Outcomes and Alerts
//!
//! Every checker run writes a result row — re-checking a healthy document
//! produces another OK row, not a no-op — while alerts are deduplicated so
//! one unresolved condition raises exactly one open alert.

use serde::{Deserialize, Serialize};
use shared_types::{ActorId, AlertId, CheckResultId, Digest, DocumentId, Timestamp};
use std::fmt;

/// Outcome of comparing a document's recorded digest with its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrityOutcome {
    /// Content present, digests match.
    Ok,
    /// Content present, digests differ.
    HashMismatch,
    /// Content could not be located (or storage stayed unavailable through
    /// the retry budget).
    FileMissing,
}

impl fmt::Display for IntegrityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntegrityOutcome::Ok => "ok",
            IntegrityOutcome::HashMismatch => "hash_mismatch",
            IntegrityOutcome::FileMissing => "file_missing",
        };
        write!(f, "{}", s)
    }
}

/// Alert severity, derived from the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl IntegrityOutcome {
    /// Severity of an alert for this outcome; `None` for OK (no alert).
    pub fn severity(&self) -> Option<Severity> {
        match self {
            IntegrityOutcome::Ok => None,
            IntegrityOutcome::HashMismatch => Some(Severity::Critical),
            IntegrityOutcome::FileMissing => Some(Severity::High),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// One integrity check of one document. Never deleted (compliance trail).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityCheckResult {
    pub id: CheckResultId,
    pub document_id: DocumentId,
    pub outcome: IntegrityOutcome,
    /// Digest recorded at upload time, as compared by this check. Recording
    /// it makes a comparison against a since-updated document
    /// self-describing rather than silently stale.
    pub recorded_digest: Digest,
    /// Digest recomputed from stored content; `None` when the content could
    /// not be read.
    pub recomputed_digest: Option<Digest>,
    /// Human-readable context for non-OK outcomes.
    pub detail: Option<String>,
    pub checked_at: Timestamp,
    /// Whether this check raised a new alert (false on dedupe).
    pub alerted: bool,
}

/// An integrity alert awaiting review. Mutated only by resolution; never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub document_id: DocumentId,
    pub outcome: IntegrityOutcome,
    pub severity: Severity,
    pub detail: String,
    pub resolved: bool,
    pub resolved_by: Option<ActorId>,
    pub resolved_at: Option<Timestamp>,
    /// Whether the external channel accepted the notification; stays false
    /// on delivery failure for out-of-band retry.
    pub notified: bool,
    pub created_at: Timestamp,
}

/// Summary handed to the notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSummary {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

/// Aggregate report of an incremental or full sweep.
///
/// The batch always completes (or is cancelled between documents) and
/// reports per-document outcomes; it never aborts on one bad document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub checked: usize,
    pub ok: usize,
    pub mismatch: usize,
    pub missing: usize,
    pub alerts_created: usize,
    /// Documents that could not be checked at all, with the reason.
    pub failures: Vec<(DocumentId, String)>,
    /// True when a full sweep was interrupted between documents.
    pub cancelled: bool,
}

impl SweepReport {
    /// Fold one result into the tallies.
    pub(crate) fn absorb(&mut self, result: &IntegrityCheckResult) {
        self.checked += 1;
        match result.outcome {
            IntegrityOutcome::Ok => self.ok += 1,
            IntegrityOutcome::HashMismatch => self.mismatch += 1,
            IntegrityOutcome::FileMissing => self.missing += 1,
        }
        if result.alerted {
            self.alerts_created += 1;
        }
    }

    /// Number of non-OK results.
    pub fn issues(&self) -> usize {
        self.mismatch + self.missing
    }
}
