//! # Lifecycle Service
//!
//! Application service applying role-gated transitions against the ledger.
//!
//! ## Concurrency
//!
//! Documents live behind per-document mutexes inside a registry map. A
//! transition locks only its document: validation, ledger append, and the
//! status update happen under that lock as one unit, so racing actors on
//! one document get exactly one winner and readers never observe an
//! intermediate state. Transaction-level follow-ups (e.g. completing a
//! trade after an invoice is paid) run after the document lock is released
//! and take other document locks one at a time.

use crate::domain::errors::LifecycleError;
use crate::domain::replay::replay_status;
use crate::domain::transaction::{TradeTransaction, TransactionStatus};
use crate::domain::transitions::{Action, Effect, TransitionTable};
use parking_lot::{Mutex, RwLock};
use sha2::{Digest as _, Sha256};
use shared_types::{
    Actor, ActorId, ContentLocation, Digest, DocStatus, DocType, Document, DocumentId, Role,
    TimeSource, Timestamp, TransactionId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tf_ledger::{LedgerAction, LedgerStore, Metadata, NewLedgerEntry};


/// Lifecycle configuration.
#[derive(Debug, Clone, Default)]
pub struct LifecycleConfig {
    /// When true, a paid invoice completes its trade transaction only once
    /// every Bill of Lading linked to the transaction is Verified; until
    /// then the transaction stays InProgress.
    pub require_bol_verification: bool,
}

/// Input for registering an uploaded document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub doc_type: DocType,
    pub doc_number: String,
    pub counterparty: Option<ActorId>,
    /// Content digest computed at upload time.
    pub digest: Digest,
    /// Where the content lives; `None` for metadata-only documents.
    pub content_location: Option<ContentLocation>,
    /// Trade transaction this document belongs to, where one exists.
    pub transaction_id: Option<TransactionId>,
}

/// Input for opening a trade: a PO plus its pending transaction.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRequest {
    pub doc_number: String,
    pub seller: ActorId,
    pub amount: f64,
    pub currency: String,
    /// Upload digest; synthesized from the issuance data when the PO is
    /// created in-flow without a file.
    pub digest: Option<Digest>,
    pub content_location: Option<ContentLocation>,
}

/// A created PO with its freshly opened transaction.
#[derive(Debug, Clone)]
pub struct CreatedPurchaseOrder {
    pub document: Document,
    pub transaction: TradeTransaction,
}

/// Result of an accepted action.
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// The document moved to a new status.
    Transitioned(Document),
    /// A new document was created; the acted-on document is unchanged.
    Spawned {
        parent: Document,
        spawned: Document,
    },
}

#[derive(Default)]
struct RegistryState {
    documents: HashMap<DocumentId, Arc<Mutex<Document>>>,
    transactions: HashMap<TransactionId, TradeTransaction>,
    /// Explicit document -> transaction linkage.
    doc_tx: HashMap<DocumentId, TransactionId>,
    /// Reverse linkage for transaction-level queries.
    tx_docs: HashMap<TransactionId, Vec<DocumentId>>,
}

/// The document state machine service.
pub struct LifecycleService {
    table: TransitionTable,
    ledger: Arc<dyn LedgerStore>,
    clock: Arc<dyn TimeSource>,
    config: LifecycleConfig,
    state: RwLock<RegistryState>,
}

impl LifecycleService {
    pub fn new(
        table: TransitionTable,
        ledger: Arc<dyn LedgerStore>,
        clock: Arc<dyn TimeSource>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            table,
            ledger,
            clock,
            config,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// The validated transition table this service runs on.
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    // =========================================================================
    // Document creation
    // =========================================================================

    /// Register an uploaded document at its type's initial status, appending
    /// the `Issued` ledger entry as part of the same unit.
    pub fn create_document(
        &self,
        req: NewDocument,
        actor: &Actor,
        metadata: Metadata,
    ) -> Result<Document, LifecycleError> {
        let now = self.clock.now();
        let document = Document {
            id: DocumentId::new(),
            doc_type: req.doc_type,
            doc_number: req.doc_number,
            owner: actor.id,
            counterparty: req.counterparty,
            status: req.doc_type.initial_status(),
            digest: req.digest,
            content_location: req.content_location,
            created_at: now,
        };
        self.register(document, actor, req.transaction_id, metadata, now)
    }

    /// Open a trade: create the PO document and its Pending transaction.
    pub fn create_purchase_order(
        &self,
        req: PurchaseOrderRequest,
        buyer: &Actor,
    ) -> Result<CreatedPurchaseOrder, LifecycleError> {
        let now = self.clock.now();
        let transaction =
            TradeTransaction::new(buyer.id, req.seller, req.amount, req.currency.clone(), now);

        let digest = req.digest.unwrap_or_else(|| {
            synthesize_digest(DocType::PurchaseOrder, &req.doc_number, buyer.id, now)
        });
        let document = Document {
            id: DocumentId::new(),
            doc_type: DocType::PurchaseOrder,
            doc_number: req.doc_number,
            owner: buyer.id,
            counterparty: Some(req.seller),
            status: DocType::PurchaseOrder.initial_status(),
            digest,
            content_location: req.content_location,
            created_at: now,
        };

        let mut metadata = Metadata::new();
        metadata.insert("amount".into(), serde_json::json!(req.amount));
        metadata.insert("currency".into(), serde_json::json!(req.currency));
        metadata.insert("seller_id".into(), serde_json::json!(req.seller.to_string()));

        {
            let mut state = self.state.write();
            state.transactions.insert(transaction.id, transaction.clone());
            state.tx_docs.entry(transaction.id).or_default();
        }
        let document = self.register(document, buyer, Some(transaction.id), metadata, now)?;

        tracing::info!(
            "[tf-lifecycle] PO {} opened transaction {} ({} {})",
            document.doc_number,
            transaction.id,
            transaction.amount,
            transaction.currency
        );
        Ok(CreatedPurchaseOrder {
            document,
            transaction,
        })
    }

    fn register(
        &self,
        document: Document,
        actor: &Actor,
        transaction_id: Option<TransactionId>,
        metadata: Metadata,
        now: Timestamp,
    ) -> Result<Document, LifecycleError> {
        let mut entry = NewLedgerEntry::new(document.id, LedgerAction::Issued, actor, now)
            .with_metadata(metadata);
        if let Some(tx) = transaction_id {
            entry = entry.with_transaction(tx);
        }

        let mut state = self.state.write();
        // Append before the document becomes visible; a failed append
        // leaves no trace of the document.
        self.ledger.append(entry)?;
        state
            .documents
            .insert(document.id, Arc::new(Mutex::new(document.clone())));
        if let Some(tx) = transaction_id {
            state.doc_tx.insert(document.id, tx);
            state.tx_docs.entry(tx).or_default().push(document.id);
        }
        Ok(document)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Actions `role` may take on the document right now. Empty means
    /// "nothing to do" (terminal status or a role with no rules there).
    pub fn allowed_actions_for(
        &self,
        document_id: DocumentId,
        role: Role,
    ) -> Result<Vec<Action>, LifecycleError> {
        let cell = self.document_cell(document_id)?;
        let doc = cell.lock();
        Ok(self.table.allowed_actions(doc.doc_type, doc.status, role))
    }

    /// Validate and apply `action` by `actor` on the document.
    ///
    /// On success the ledger entry and the status update are committed as
    /// one unit under the document's lock.
    pub fn apply_action(
        &self,
        document_id: DocumentId,
        action: Action,
        actor: &Actor,
        metadata: Metadata,
    ) -> Result<ApplyOutcome, LifecycleError> {
        let cell = self.document_cell(document_id)?;
        let transaction_id = self.state.read().doc_tx.get(&document_id).copied();

        let outcome = {
            let mut doc = cell.lock();
            let effect = self
                .table
                .resolve(doc.doc_type, doc.status, actor.role, action)
                .ok_or(LifecycleError::InvalidTransition {
                    doc_type: doc.doc_type,
                    current: doc.status,
                    role: actor.role,
                    action,
                })?;

            match effect {
                Effect::MoveTo(target) => {
                    let now = self.clock.now();
                    let mut entry =
                        NewLedgerEntry::new(doc.id, action.ledger_action(), actor, now)
                            .with_metadata(metadata);
                    if let Some(tx) = transaction_id {
                        entry = entry.with_transaction(tx);
                    }
                    self.ledger.append(entry)?;
                    doc.status = target;
                    tracing::info!(
                        "[tf-lifecycle] {} {} -> {} by {} ({})",
                        doc.doc_type,
                        doc.doc_number,
                        target,
                        actor.role,
                        action
                    );
                    ApplyOutcome::Transitioned(doc.clone())
                }
                Effect::Spawn(spawn_type) => {
                    let spawned = self.spawn_document(&doc, spawn_type, actor, transaction_id)?;
                    ApplyOutcome::Spawned {
                        parent: doc.clone(),
                        spawned,
                    }
                }
            }
        };

        // Transaction follow-ups run outside the document lock; they take
        // other document locks one at a time.
        if let (Some(tx), ApplyOutcome::Transitioned(doc)) = (transaction_id, &outcome) {
            self.after_transition(tx, doc, action);
        }
        Ok(outcome)
    }

    /// Create the spawned document (e.g. a LOC against a PO). The parent
    /// stays untouched; the spawned document gets its own `Issued` entry.
    fn spawn_document(
        &self,
        parent: &Document,
        spawn_type: DocType,
        actor: &Actor,
        transaction_id: Option<TransactionId>,
    ) -> Result<Document, LifecycleError> {
        let now = self.clock.now();
        let doc_number = format!("{}-{}", spawn_type, parent.doc_number);
        let document = Document {
            id: DocumentId::new(),
            doc_type: spawn_type,
            doc_number: doc_number.clone(),
            owner: actor.id,
            counterparty: Some(parent.owner),
            status: spawn_type.initial_status(),
            digest: synthesize_digest(spawn_type, &doc_number, actor.id, now),
            content_location: None,
            created_at: now,
        };

        let mut metadata = Metadata::new();
        metadata.insert(
            "issued_against".into(),
            serde_json::json!(parent.id.to_string()),
        );

        let spawned = self.register(document, actor, transaction_id, metadata, now)?;
        tracing::info!(
            "[tf-lifecycle] {} spawned {} against {} {}",
            actor.role,
            spawned.doc_number,
            parent.doc_type,
            parent.doc_number
        );
        Ok(spawned)
    }

    fn after_transition(&self, transaction_id: TransactionId, doc: &Document, action: Action) {
        match (doc.doc_type, action) {
            (DocType::PurchaseOrder, Action::Verify) => {
                self.update_transaction(transaction_id, |tx| {
                    if tx.status == TransactionStatus::Pending {
                        tx.status = TransactionStatus::InProgress;
                        true
                    } else {
                        false
                    }
                });
            }
            (DocType::Invoice, Action::Pay) => self.try_complete(transaction_id),
            (DocType::BillOfLading, Action::Verify) if self.config.require_bol_verification => {
                // A late BOL verification may be the last thing holding the
                // transaction open.
                self.try_complete(transaction_id)
            }
            _ => {}
        }
    }

    /// Complete the transaction if an invoice is paid and, where required,
    /// every linked BOL is verified.
    fn try_complete(&self, transaction_id: TransactionId) {
        let docs = self.transaction_documents(transaction_id);
        let invoice_paid = docs
            .iter()
            .any(|d| d.doc_type == DocType::Invoice && d.status == DocStatus::Paid);
        if !invoice_paid {
            return;
        }

        if self.config.require_bol_verification {
            let unverified_bol = docs
                .iter()
                .any(|d| d.doc_type == DocType::BillOfLading && d.status != DocStatus::Verified);
            if unverified_bol {
                tracing::warn!(
                    "[tf-lifecycle] transaction {} completion deferred: bill of lading not verified",
                    transaction_id
                );
                return;
            }
        }

        self.update_transaction(transaction_id, |tx| {
            if tx.status != TransactionStatus::Completed {
                tx.status = TransactionStatus::Completed;
                true
            } else {
                false
            }
        });
    }

    fn update_transaction(
        &self,
        transaction_id: TransactionId,
        f: impl FnOnce(&mut TradeTransaction) -> bool,
    ) {
        let now = self.clock.now();
        let mut state = self.state.write();
        if let Some(tx) = state.transactions.get_mut(&transaction_id) {
            if f(tx) {
                tx.updated_at = now;
                tracing::info!(
                    "[tf-lifecycle] transaction {} is now {}",
                    transaction_id,
                    tx.status
                );
            }
        }
    }

    // =========================================================================
    // History verification
    // =========================================================================

    /// Replay the document's ledger history through the table and compare
    /// with its recorded status.
    pub fn verify_history(&self, document_id: DocumentId) -> Result<DocStatus, LifecycleError> {
        let cell = self.document_cell(document_id)?;
        let (doc_type, recorded) = {
            let doc = cell.lock();
            (doc.doc_type, doc.status)
        };
        let entries = self.ledger.entries_for(document_id);

        let replayed = replay_status(&self.table, doc_type, &entries).map_err(|illegal| {
            LifecycleError::ReplayIllegalEntry {
                document_id,
                seq: illegal.seq,
                action: illegal.action,
                role: illegal.role,
                at: illegal.at,
            }
        })?;

        if replayed != recorded {
            return Err(LifecycleError::ReplayDiverged {
                document_id,
                replayed,
                recorded,
            });
        }
        Ok(replayed)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    fn document_cell(&self, id: DocumentId) -> Result<Arc<Mutex<Document>>, LifecycleError> {
        self.state
            .read()
            .documents
            .get(&id)
            .cloned()
            .ok_or(LifecycleError::UnknownDocument(id))
    }

    /// Snapshot of one document.
    pub fn document(&self, id: DocumentId) -> Option<Document> {
        let cell = self.state.read().documents.get(&id).cloned()?;
        let doc = cell.lock().clone();
        Some(doc)
    }

    /// Snapshot of every document. Collects the cells first, then locks one
    /// at a time, so it never contends with an in-flight transition beyond
    /// that document's own lock.
    pub fn all_documents(&self) -> Vec<Document> {
        let cells: Vec<_> = self.state.read().documents.values().cloned().collect();
        let mut docs: Vec<_> = cells.iter().map(|c| c.lock().clone()).collect();
        docs.sort_by_key(|d| (d.created_at, d.id));
        docs
    }

    /// Snapshot of documents created at or after `since`.
    pub fn documents_created_since(&self, since: Timestamp) -> Vec<Document> {
        self.all_documents()
            .into_iter()
            .filter(|d| d.created_at >= since)
            .collect()
    }

    /// Snapshot of one trade transaction.
    pub fn transaction(&self, id: TransactionId) -> Option<TradeTransaction> {
        self.state.read().transactions.get(&id).cloned()
    }

    /// Snapshots of every document linked to a transaction.
    pub fn transaction_documents(&self, id: TransactionId) -> Vec<Document> {
        let cells: Vec<_> = {
            let state = self.state.read();
            state
                .tx_docs
                .get(&id)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|doc_id| state.documents.get(doc_id).cloned())
                        .collect()
                })
                .unwrap_or_default()
        };
        cells.iter().map(|c| c.lock().clone()).collect()
    }
}

/// Digest for documents created in-flow without an uploaded file, computed
/// over the issuance data so it is stable and unique per issuance.
fn synthesize_digest(
    doc_type: DocType,
    doc_number: &str,
    owner: ActorId,
    now: Timestamp,
) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}:{}", doc_type, doc_number, owner, now).as_bytes());
    let bytes: [u8; 32] = hasher.finalize().into();
    Digest::from_bytes(&bytes)
}
