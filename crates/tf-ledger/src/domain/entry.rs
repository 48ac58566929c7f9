//! # Ledger Entries
//!
//! The immutable record of one accepted lifecycle event or integrity
//! outcome. Relational references (`document_id`, `transaction_id`) are
//! first-class fields; the metadata map is free-form audit context only and
//! is never queried relationally.

use serde::{Deserialize, Serialize};
use shared_types::{Actor, ActorId, DocumentId, LedgerEntryId, Role, Timestamp, TransactionId};
use std::fmt;

/// Free-form audit context attached to a ledger entry (amounts, tracking
/// ids, verifier notes).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Persists metadata as a JSON-encoded string column.
///
/// `serde_json::Value` needs self-describing deserialization, which the
/// binary log encoding does not provide; the JSON text form round-trips
/// through any format.
mod metadata_codec {
    use super::Metadata;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(metadata: &Metadata, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::to_string(metadata)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Metadata, D::Error> {
        let text = String::deserialize(deserializer)?;
        serde_json::from_str(&text).map_err(serde::de::Error::custom)
    }
}

/// Recorded ledger actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerAction {
    /// Document created/uploaded.
    Issued,
    /// Document corrected; the correction is a new entry, not an edit.
    Amended,
    /// Goods dispatched.
    Shipped,
    /// Goods received.
    Received,
    /// Invoice settled.
    Paid,
    /// Document withdrawn.
    Cancelled,
    /// Document endorsed by an auditor.
    Verified,
    /// Integrity checker detected a mismatch or missing file.
    IntegrityAlert,
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LedgerAction::Issued => "ISSUED",
            LedgerAction::Amended => "AMENDED",
            LedgerAction::Shipped => "SHIPPED",
            LedgerAction::Received => "RECEIVED",
            LedgerAction::Paid => "PAID",
            LedgerAction::Cancelled => "CANCELLED",
            LedgerAction::Verified => "VERIFIED",
            LedgerAction::IntegrityAlert => "INTEGRITY_ALERT",
        };
        write!(f, "{}", s)
    }
}

/// Input to [`crate::LedgerStore::append`]; id and sequence number are
/// assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    /// Document the event belongs to.
    pub document_id: DocumentId,
    /// What happened.
    pub action: LedgerAction,
    /// Who performed it.
    pub actor_id: ActorId,
    /// Actor role snapshot at the time of the action.
    pub actor_role: Role,
    /// Trade transaction the event belongs to, where one exists.
    pub transaction_id: Option<TransactionId>,
    /// When it happened (stamped by the caller's time source).
    pub timestamp: Timestamp,
    /// Free-form audit context.
    #[serde(with = "metadata_codec")]
    pub metadata: Metadata,
}

impl NewLedgerEntry {
    pub fn new(
        document_id: DocumentId,
        action: LedgerAction,
        actor: &Actor,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            document_id,
            action,
            actor_id: actor.id,
            actor_role: actor.role,
            transaction_id: None,
            timestamp,
            metadata: Metadata::new(),
        }
    }

    /// Attach the owning trade transaction.
    pub fn with_transaction(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Attach audit metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// An appended, immutable ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// Store-assigned monotonic sequence number; breaks timestamp ties.
    pub seq: u64,
    /// Document the event belongs to.
    pub document_id: DocumentId,
    /// What happened.
    pub action: LedgerAction,
    /// Who performed it.
    pub actor_id: ActorId,
    /// Actor role snapshot at the time of the action.
    pub actor_role: Role,
    /// Trade transaction the event belongs to, where one exists.
    pub transaction_id: Option<TransactionId>,
    /// When it happened.
    pub timestamp: Timestamp,
    /// Free-form audit context.
    #[serde(with = "metadata_codec")]
    pub metadata: Metadata,
}

impl LedgerEntry {
    /// Ordering key: timestamp ascending, sequence number as tie-break.
    pub fn order_key(&self) -> (Timestamp, u64) {
        (self.timestamp, self.seq)
    }
}
