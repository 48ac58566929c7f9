//! # Document State Machine (tf-lifecycle)
//!
//! Gates and applies document status transitions per document type, records
//! every accepted transition in the append-only ledger, and maintains the
//! trade-transaction linkage between related documents.
//!
//! ## Domain Invariants
//!
//! | # | Invariant | Description |
//! |---|-----------|-------------|
//! | 1 | Replay Consistency | Replaying a document's ledger entries through the transition table from its initial status reproduces its recorded status |
//! | 2 | No Skips | An accepted action always lands on the table's declared target status |
//! | 3 | Serialized Transitions | At most one in-flight transition per document; racing actors get exactly one winner |
//! | 4 | Atomic Unit | Ledger append and status update happen as one unit; a failed append leaves the status untouched |
//! | 5 | Validated Table | Dangling targets and unreachable statuses are rejected at startup, never discovered per-call |
//!
//! ## Crate Structure
//!
//! - `domain/` - Transition table, replay logic, trade transactions, errors
//! - `service/` - Application service applying transitions against the ledger
//!
//! ## Usage
//!
//! ```ignore
//! use tf_lifecycle::{LifecycleService, LifecycleConfig, TransitionTable};
//!
//! let table = TransitionTable::default_rules()?;
//! let service = LifecycleService::new(table, ledger, clock, LifecycleConfig::default());
//!
//! let po = service.create_purchase_order(req, &buyer)?;
//! service.apply_action(po.document.id, Action::Verify, &auditor, Metadata::new())?;
//! ```

pub mod domain;
pub mod service;

pub use domain::errors::LifecycleError;
pub use domain::transaction::{TradeTransaction, TransactionStatus};
pub use domain::transitions::{Action, Effect, TableError, TransitionTable, TransitionTableBuilder};
pub use service::{
    ApplyOutcome, CreatedPurchaseOrder, LifecycleConfig, LifecycleService, NewDocument,
    PurchaseOrderRequest,
};
