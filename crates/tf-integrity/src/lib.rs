//! # Integrity Subsystem (tf-integrity)
//!
//! Detects drift between recorded and actual document content: recomputes
//! content digests on a schedule (and on demand), compares them to the
//! digest recorded at upload time, and raises deduplicated alerts on
//! mismatch or missing files.
//!
//! ## Domain Invariants
//!
//! | # | Invariant | Description |
//! |---|-----------|-------------|
//! | 1 | Byte-Exact Digests | The same algorithm hashes content at upload and at every later verification |
//! | 2 | Independent Checks | A failure checking one document never aborts the batch |
//! | 3 | No Duplicate Open Alerts | At most one unresolved alert per (document, outcome) |
//! | 4 | Self-Describing Results | Every result row records which digest it compared against |
//! | 5 | Interruptible Sweeps | A cancelled full sweep keeps already-written result rows |
//!
//! ## Crate Structure
//!
//! - `hashing` - Content digest port and SHA-256 adapter
//! - `domain/` - Outcomes, results, alerts, sweep reports, errors
//! - `ports/` - Outbound ports (storage backend, document directory,
//!   notification channel) with in-memory adapters for tests
//! - `alerts` - Alert sink with dedupe and best-effort notification
//! - `checker` - Single-document check, incremental and full sweeps
//! - `scheduler` - Background cadences over the checker

pub mod alerts;
pub mod checker;
pub mod domain;
pub mod hashing;
pub mod ports;
pub mod scheduler;

pub use alerts::{AlertSink, AlertSinkConfig};
pub use checker::{CancelFlag, IntegrityChecker, IntegrityConfig};
pub use domain::errors::{AlertError, IntegrityError, NotifyError, StorageError};
pub use domain::outcome::{
    Alert, AlertSummary, IntegrityCheckResult, IntegrityOutcome, Severity, SweepReport,
};
pub use hashing::{sha256_digest, ContentHasher, Sha256Hasher};
pub use ports::outbound::{
    DocumentDirectory, DocumentSnapshot, InMemoryStorageBackend, LoggingNotifier,
    NotificationChannel, StaticDirectory, StorageBackend,
};
pub use scheduler::{IntegrityScheduler, SchedulerConfig};
