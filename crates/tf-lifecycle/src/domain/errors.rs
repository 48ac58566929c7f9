//! # Lifecycle Errors
//!
//! A rejected transition states the current status and the role that
//! attempted the action, so the refusal is auditable rather than a bare
//! "forbidden".

use crate::domain::transitions::Action;
use shared_types::{DocStatus, DocType, DocumentId, Role, TransactionId};
use tf_ledger::{LedgerAction, LedgerError};
use thiserror::Error;

/// Errors surfaced by the lifecycle service.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The action is not permitted from the document's current state for
    /// the actor's role. User-correctable; surfaced as a rejected request.
    #[error("invalid transition: {role} may not {action} a {doc_type} in status {current}")]
    InvalidTransition {
        doc_type: DocType,
        current: DocStatus,
        role: Role,
        action: Action,
    },

    /// The referenced document does not exist.
    #[error("unknown document: {0}")]
    UnknownDocument(DocumentId),

    /// The referenced trade transaction does not exist.
    #[error("unknown transaction: {0}")]
    UnknownTransaction(TransactionId),

    /// Replaying the document's ledger history did not reproduce its
    /// recorded status.
    #[error("history of document {document_id} replays to {replayed}, but recorded status is {recorded}")]
    ReplayDiverged {
        document_id: DocumentId,
        replayed: DocStatus,
        recorded: DocStatus,
    },

    /// The ledger history contains an entry no table rule permits.
    #[error("history of document {document_id} has entry seq {seq} ({action} by {role} at {at}) that no rule permits")]
    ReplayIllegalEntry {
        document_id: DocumentId,
        seq: u64,
        action: LedgerAction,
        role: Role,
        at: DocStatus,
    },

    /// Durability error from the ledger store, propagated unchanged.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
