//! # Core Domain Entities
//!
//! Defines the trade-finance document entities shared across subsystems.
//!
//! ## Clusters
//!
//! - **Documents**: `DocType`, `DocStatus`, `Document`
//! - **Parties**: `Role`, `Actor`
//! - **Content**: `Digest`, `ContentLocation`

use crate::ids::{ActorId, DocumentId};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: DOCUMENTS
// =============================================================================

/// The fixed set of trade-finance document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocType {
    /// Purchase Order raised by a buyer.
    PurchaseOrder,
    /// Letter of Credit issued by a bank against a PO.
    LetterOfCredit,
    /// Bill of Lading covering the physical shipment.
    BillOfLading,
    /// Commercial invoice payable by the buyer's bank.
    Invoice,
    /// Certificate of Origin.
    CertificateOfOrigin,
    /// Insurance certificate covering the shipment.
    InsuranceCertificate,
}

impl DocType {
    /// The status every document of this type starts in.
    ///
    /// All types currently start at `Issued`; the method exists so the
    /// transition table never hardcodes the initial state at call sites.
    pub fn initial_status(&self) -> DocStatus {
        DocStatus::Issued
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocType::PurchaseOrder => "PO",
            DocType::LetterOfCredit => "LOC",
            DocType::BillOfLading => "BOL",
            DocType::Invoice => "INVOICE",
            DocType::CertificateOfOrigin => "COO",
            DocType::InsuranceCertificate => "INSURANCE_CERT",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle status of a document.
///
/// Which statuses are reachable for a given [`DocType`] is defined by the
/// transition table, not by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocStatus {
    /// Initial status at creation/upload.
    Issued,
    /// Endorsed by an auditor.
    Verified,
    /// Goods dispatched (Bill of Lading only).
    Shipped,
    /// Goods received by the buyer (Bill of Lading only).
    Received,
    /// Settled by the paying bank (Invoice only).
    Paid,
    /// Withdrawn before completion.
    Cancelled,
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocStatus::Issued => "ISSUED",
            DocStatus::Verified => "VERIFIED",
            DocStatus::Shipped => "SHIPPED",
            DocStatus::Received => "RECEIVED",
            DocStatus::Paid => "PAID",
            DocStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// CLUSTER B: PARTIES
// =============================================================================

/// Party roles, used purely as lookup keys into the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Corporate party purchasing goods.
    Buyer,
    /// Corporate party supplying goods.
    Seller,
    /// Financing/paying bank.
    Bank,
    /// Independent auditor verifying documents.
    Auditor,
    /// Platform administrator.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Buyer => "BUYER",
            Role::Seller => "SELLER",
            Role::Bank => "BANK",
            Role::Auditor => "AUDITOR",
            Role::Admin => "ADMIN",
        };
        write!(f, "{}", s)
    }
}

/// Authenticated actor identity, supplied by the host on every call.
///
/// The core trusts this input as already-authenticated; the role is
/// snapshotted into ledger entries at the time of the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable actor identifier.
    pub id: ActorId,
    /// Role at the time of the call.
    pub role: Role,
    /// Organisation the actor belongs to.
    pub org: String,
}

impl Actor {
    pub fn new(id: ActorId, role: Role, org: impl Into<String>) -> Self {
        Self {
            id,
            role,
            org: org.into(),
        }
    }

    /// The reserved identity the integrity worker acts under.
    pub fn system() -> Self {
        Self {
            id: ActorId::system(),
            role: Role::Admin,
            org: "system".to_string(),
        }
    }
}

// =============================================================================
// CLUSTER C: CONTENT
// =============================================================================

/// A lowercase-hex SHA-256 content digest (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(String);

/// Errors parsing an externally-supplied digest string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    #[error("digest must be 64 hex characters, got {0}")]
    BadLength(usize),
    #[error("digest contains non-hex characters")]
    NotHex,
}

impl Digest {
    /// Length of the hex encoding of a SHA-256 digest.
    pub const HEX_LEN: usize = 64;

    /// Wrap an already-computed lowercase hex digest, validating shape.
    pub fn parse(hex_str: &str) -> Result<Self, DigestError> {
        if hex_str.len() != Self::HEX_LEN {
            return Err(DigestError::BadLength(hex_str.len()));
        }
        if hex::decode(hex_str).is_err() {
            return Err(DigestError::NotHex);
        }
        Ok(Self(hex_str.to_ascii_lowercase()))
    }

    /// Build from raw digest bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to stored file content (local path, object key, ...).
///
/// The core never interprets this; it is handed back to the storage
/// backend verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentLocation(pub String);

impl ContentLocation {
    pub fn new(loc: impl Into<String>) -> Self {
        Self(loc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked trade-finance document.
///
/// Created on upload with `status = doc_type.initial_status()`; the status
/// field is mutated only through the lifecycle service's apply-transition
/// operation, and documents are never deleted (history lives in the ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable document identifier.
    pub id: DocumentId,
    /// Document type, fixed at creation.
    pub doc_type: DocType,
    /// Human-facing document number (e.g. "PO-2024-0042").
    pub doc_number: String,
    /// Owning party.
    pub owner: ActorId,
    /// Counterparty, where one exists (e.g. the seller on a PO).
    pub counterparty: Option<ActorId>,
    /// Current lifecycle status.
    pub status: DocStatus,
    /// Content digest recorded at upload time.
    pub digest: Digest,
    /// Where the content lives; `None` for metadata-only documents created
    /// in-flow (these have a digest over their issuance data instead).
    pub content_location: Option<ContentLocation>,
    /// Creation timestamp (seconds since epoch).
    pub created_at: Timestamp,
}
