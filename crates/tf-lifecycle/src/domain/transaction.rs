//! # Trade Transactions
//!
//! A trade transaction groups the documents exchanged between a buyer and a
//! seller for one deal. Documents reference their transaction through an
//! explicit identifier (on ledger entries and in the service's linkage map),
//! never by scanning serialized metadata.

use serde::{Deserialize, Serialize};
use shared_types::{ActorId, Timestamp, TransactionId};
use std::fmt;

/// Settlement progress of a trade transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// PO raised, documents not yet verified.
    Pending,
    /// PO verified; shipment and settlement underway.
    InProgress,
    /// Invoice paid (and, where configured, shipment verified).
    Completed,
    /// Escalated for manual review.
    Disputed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::InProgress => "in_progress",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Disputed => "disputed",
        };
        write!(f, "{}", s)
    }
}

/// One buyer/seller deal and its settlement state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeTransaction {
    pub id: TransactionId,
    pub buyer: ActorId,
    pub seller: ActorId,
    /// Deal amount in `currency` units.
    pub amount: f64,
    /// ISO 4217 currency code.
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TradeTransaction {
    pub fn new(
        buyer: ActorId,
        seller: ActorId,
        amount: f64,
        currency: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            buyer,
            seller,
            amount,
            currency: currency.into(),
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
