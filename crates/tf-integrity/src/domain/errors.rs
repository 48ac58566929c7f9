//! # Integrity Errors
//!
//! Storage unavailability is retryable and distinct from a genuinely
//! missing file; within a batch sweep, per-document errors are captured in
//! the report and never abort the batch.

use shared_types::{AlertId, DocumentId};
use thiserror::Error;

/// Errors returned by the storage backend collaborator.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// No content exists at the location.
    #[error("content not found")]
    NotFound,

    /// Transient failure reading the backend; retryable.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Underlying error description.
        message: String,
    },
}

/// Errors surfaced by the integrity checker.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// The referenced document does not exist.
    #[error("unknown document: {0}")]
    UnknownDocument(DocumentId),
}

/// Errors resolving alerts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    /// The alert was already resolved; resolution is not idempotent.
    #[error("alert {0} is already resolved")]
    AlreadyResolved(AlertId),

    /// No alert with this id exists.
    #[error("alert {0} not found")]
    NotFound(AlertId),
}

/// Failure delivering a notification to the external channel.
///
/// Best-effort by contract: recording an alert never fails because of this.
#[derive(Debug, Clone, Error)]
#[error("notification failed: {message}")]
pub struct NotifyError {
    /// Underlying error description.
    pub message: String,
}
