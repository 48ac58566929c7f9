//! Lifecycle scenarios across the ledger: the seven-step trade flow,
//! replay verification, durability, and racing actors.

#![cfg(test)]

use super::helpers::*;
use shared_types::{DocStatus, DocType, SystemTimeSource};
use std::sync::Arc;
use tf_ledger::{FileBackedLedgerStore, LedgerAction, LedgerStore, Metadata};
use tf_lifecycle::domain::replay::replay_status;
use tf_lifecycle::{
    Action, ApplyOutcome, LifecycleConfig, LifecycleService, NewDocument, PurchaseOrderRequest,
    TransactionStatus, TransitionTable,
};

fn po_request(seller_id: shared_types::ActorId, number: &str) -> PurchaseOrderRequest {
    PurchaseOrderRequest {
        doc_number: number.into(),
        seller: seller_id,
        amount: 250_000.0,
        currency: "USD".into(),
        digest: None,
        content_location: None,
    }
}

#[test]
fn seven_step_trade_flow() {
    let stack = stack();
    let (buyer, seller, bank, auditor) = (buyer(), seller(), bank(), auditor());

    // 1. Buyer creates the PO; transaction opens pending.
    let po = stack
        .lifecycle
        .create_purchase_order(po_request(seller.id, "PO-1001"), &buyer)
        .unwrap();
    assert_eq!(po.transaction.status, TransactionStatus::Pending);

    // 2. Bank issues the LOC against the PO.
    let outcome = stack
        .lifecycle
        .apply_action(po.document.id, Action::IssueLoc, &bank, Metadata::new())
        .unwrap();
    let loc = match outcome {
        ApplyOutcome::Spawned { spawned, parent } => {
            assert_eq!(parent.status, DocStatus::Issued);
            spawned
        }
        other => panic!("expected spawned LOC, got {:?}", other),
    };

    // 3. Auditor verifies PO and LOC; transaction moves in progress.
    stack
        .lifecycle
        .apply_action(po.document.id, Action::Verify, &auditor, Metadata::new())
        .unwrap();
    stack
        .lifecycle
        .apply_action(loc.id, Action::Verify, &auditor, Metadata::new())
        .unwrap();
    assert_eq!(
        stack.lifecycle.transaction(po.transaction.id).unwrap().status,
        TransactionStatus::InProgress
    );

    // 4. Seller uploads the BOL.
    let (bol_loc, bol_digest) = upload_content(&stack, "BOL-1001", b"bill of lading body");
    let bol = stack
        .lifecycle
        .create_document(
            NewDocument {
                doc_type: DocType::BillOfLading,
                doc_number: "BOL-1001".into(),
                counterparty: Some(buyer.id),
                digest: bol_digest,
                content_location: Some(bol_loc),
                transaction_id: Some(po.transaction.id),
            },
            &seller,
            Metadata::new(),
        )
        .unwrap();

    // 5. Seller issues the invoice.
    let (inv_loc, inv_digest) = upload_content(&stack, "INV-1001", b"invoice body");
    let invoice = stack
        .lifecycle
        .create_document(
            NewDocument {
                doc_type: DocType::Invoice,
                doc_number: "INV-1001".into(),
                counterparty: Some(buyer.id),
                digest: inv_digest,
                content_location: Some(inv_loc),
                transaction_id: Some(po.transaction.id),
            },
            &seller,
            Metadata::new(),
        )
        .unwrap();

    // 6. Ship, receive.
    stack
        .lifecycle
        .apply_action(bol.id, Action::Ship, &seller, Metadata::new())
        .unwrap();
    stack
        .lifecycle
        .apply_action(bol.id, Action::Receive, &buyer, Metadata::new())
        .unwrap();

    // 7. Bank pays the invoice; transaction completes.
    stack
        .lifecycle
        .apply_action(invoice.id, Action::Pay, &bank, Metadata::new())
        .unwrap();
    assert_eq!(
        stack.lifecycle.transaction(po.transaction.id).unwrap().status,
        TransactionStatus::Completed
    );

    // Every document's recorded status replays from its ledger history.
    for doc in stack.lifecycle.all_documents() {
        stack.lifecycle.verify_history(doc.id).unwrap();
    }

    // The transaction's documents are reachable through the explicit
    // linkage, not metadata scans.
    let linked = stack.lifecycle.transaction_documents(po.transaction.id);
    assert_eq!(linked.len(), 4); // PO, LOC, BOL, invoice
}

#[test]
fn bol_scenario_ledger_has_three_action_entries_in_order() {
    let stack = stack();
    let (buyer, seller, auditor) = (buyer(), seller(), auditor());

    let (location, digest) = upload_content(&stack, "BOL-7", b"manifest");
    let bol = stack
        .lifecycle
        .create_document(
            NewDocument {
                doc_type: DocType::BillOfLading,
                doc_number: "BOL-7".into(),
                counterparty: Some(buyer.id),
                digest,
                content_location: Some(location),
                transaction_id: None,
            },
            &seller,
            Metadata::new(),
        )
        .unwrap();

    stack
        .lifecycle
        .apply_action(bol.id, Action::Ship, &seller, Metadata::new())
        .unwrap();
    stack
        .lifecycle
        .apply_action(bol.id, Action::Receive, &buyer, Metadata::new())
        .unwrap();
    stack
        .lifecycle
        .apply_action(bol.id, Action::Verify, &auditor, Metadata::new())
        .unwrap();

    let actions: Vec<_> = stack
        .ledger
        .entries_for(bol.id)
        .into_iter()
        .filter(|e| e.action != LedgerAction::Issued)
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            LedgerAction::Shipped,
            LedgerAction::Received,
            LedgerAction::Verified
        ]
    );
    assert_eq!(
        stack.lifecycle.verify_history(bol.id).unwrap(),
        DocStatus::Verified
    );
}

#[test]
fn history_survives_restart_of_the_ledger_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.bin");
    let (buyer, seller, auditor) = (buyer(), seller(), auditor());

    let bol_id = {
        let ledger = Arc::new(FileBackedLedgerStore::open(&path).unwrap());
        let lifecycle = LifecycleService::new(
            TransitionTable::default_rules().unwrap(),
            ledger,
            Arc::new(SystemTimeSource),
            LifecycleConfig::default(),
        );
        let bol = lifecycle
            .create_document(
                NewDocument {
                    doc_type: DocType::BillOfLading,
                    doc_number: "BOL-55".into(),
                    counterparty: Some(buyer.id),
                    digest: tf_integrity::sha256_digest(b"manifest"),
                    content_location: None,
                    transaction_id: None,
                },
                &seller,
                Metadata::new(),
            )
            .unwrap();
        lifecycle
            .apply_action(bol.id, Action::Ship, &seller, Metadata::new())
            .unwrap();
        lifecycle
            .apply_action(bol.id, Action::Receive, &buyer, Metadata::new())
            .unwrap();
        lifecycle
            .apply_action(bol.id, Action::Verify, &auditor, Metadata::new())
            .unwrap();
        bol.id
    };

    // Reopen the log and replay the persisted history through a fresh table.
    let reopened = FileBackedLedgerStore::open(&path).unwrap();
    let entries = reopened.entries_for(bol_id);
    assert_eq!(entries.len(), 4);

    let table = TransitionTable::default_rules().unwrap();
    let replayed = replay_status(&table, DocType::BillOfLading, &entries).unwrap();
    assert_eq!(replayed, DocStatus::Verified);
}

#[test]
fn racing_auditors_get_exactly_one_success() {
    let stack = stack();
    let po = stack
        .lifecycle
        .create_purchase_order(po_request(seller().id, "PO-RACE"), &buyer())
        .unwrap();
    let doc_id = po.document.id;

    let barrier = Arc::new(std::sync::Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lifecycle = stack.lifecycle.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                let auditor = auditor();
                barrier.wait();
                lifecycle.apply_action(doc_id, Action::Verify, &auditor, Metadata::new())
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Result::is_ok)
        .count();
    assert_eq!(successes, 1);

    assert_eq!(
        stack.lifecycle.document(doc_id).unwrap().status,
        DocStatus::Verified
    );
    stack.lifecycle.verify_history(doc_id).unwrap();
}
