//! # Transition Table
//!
//! The authoritative mapping from (document type, current status, actor
//! role) to (permitted action, effect). The table is a statically validated
//! set of typed rules rather than nested string-keyed maps, so a typo is a
//! build failure instead of a silent no-op lookup.
//!
//! Absence of a rule for a (type, status, role) triple means "nothing to
//! do", not "forbidden": `allowed_actions` returns an empty list and the
//! caller surfaces "no actions available" rather than a permission error.

use serde::{Deserialize, Serialize};
use shared_types::{DocStatus, DocType, Role};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tf_ledger::LedgerAction;
use thiserror::Error;

/// Actions an actor can request on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Auditor endorsement.
    Verify,
    /// Bank issues a Letter of Credit against a PO.
    IssueLoc,
    /// Seller dispatches the goods.
    Ship,
    /// Buyer confirms receipt.
    Receive,
    /// Bank settles an invoice.
    Pay,
    /// Correction; recorded as a new entry, the document stays in place.
    Amend,
    /// Withdrawal before completion.
    Cancel,
}

impl Action {
    /// The ledger action recorded when this action is accepted.
    pub fn ledger_action(&self) -> LedgerAction {
        match self {
            Action::Verify => LedgerAction::Verified,
            Action::IssueLoc => LedgerAction::Issued,
            Action::Ship => LedgerAction::Shipped,
            Action::Receive => LedgerAction::Received,
            Action::Pay => LedgerAction::Paid,
            Action::Amend => LedgerAction::Amended,
            Action::Cancel => LedgerAction::Cancelled,
        }
    }

    /// Reverse mapping used when replaying ledger history.
    ///
    /// `Issued` and `IntegrityAlert` entries do not correspond to a
    /// requestable action (creation and integrity events), so they map to
    /// `None` and are skipped by replay.
    pub fn from_ledger_action(action: LedgerAction) -> Option<Self> {
        match action {
            LedgerAction::Verified => Some(Action::Verify),
            LedgerAction::Shipped => Some(Action::Ship),
            LedgerAction::Received => Some(Action::Receive),
            LedgerAction::Paid => Some(Action::Pay),
            LedgerAction::Amended => Some(Action::Amend),
            LedgerAction::Cancelled => Some(Action::Cancel),
            LedgerAction::Issued | LedgerAction::IntegrityAlert => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Verify => "VERIFY",
            Action::IssueLoc => "ISSUE_LOC",
            Action::Ship => "SHIP",
            Action::Receive => "RECEIVE",
            Action::Pay => "PAY",
            Action::Amend => "AMEND",
            Action::Cancel => "CANCEL",
        };
        write!(f, "{}", s)
    }
}

/// What an accepted action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Move the document to the target status.
    MoveTo(DocStatus),
    /// Create a new document of the given type; the acted-on document is
    /// unaffected (e.g. `IssueLoc` on a PO spawns a LOC).
    Spawn(DocType),
}

/// One rule of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub doc_type: DocType,
    pub from: DocStatus,
    pub role: Role,
    pub action: Action,
    pub effect: Effect,
}

/// Configuration errors detected when building a table.
///
/// These are fatal at startup validation; a validated table cannot produce
/// them at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The same (type, status, role, action) appears twice.
    #[error("duplicate rule: {role} {action} on {doc_type} in {from}")]
    DuplicateRule {
        doc_type: DocType,
        from: DocStatus,
        role: Role,
        action: Action,
    },

    /// A `MoveTo` target has no rules and is not declared terminal.
    #[error("dangling target: {action} on {doc_type} moves to {target}, which has no rules and is not declared terminal")]
    DanglingTarget {
        doc_type: DocType,
        action: Action,
        target: DocStatus,
    },

    /// A rule's from-status can never be reached from the initial status.
    #[error("unreachable status: {doc_type} has rules in {status}, but {status} is not reachable from {initial}")]
    UnreachableStatus {
        doc_type: DocType,
        status: DocStatus,
        initial: DocStatus,
    },
}

/// Validated transition table.
///
/// Built once at startup via [`TransitionTableBuilder`]; lookups are pure
/// and infallible.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rules: HashMap<(DocType, DocStatus, Role), Vec<(Action, Effect)>>,
}

impl TransitionTable {
    /// Builder for a custom rule set.
    pub fn builder() -> TransitionTableBuilder {
        TransitionTableBuilder::new()
    }

    /// The default trade-finance rule set.
    pub fn default_rules() -> Result<Self, TableError> {
        use Action::*;
        use DocStatus::*;
        use DocType::*;
        use Role::*;

        Self::builder()
            // Purchase Order
            .rule(PurchaseOrder, Issued, Auditor, Verify, Effect::MoveTo(Verified))
            .rule(PurchaseOrder, Issued, Bank, IssueLoc, Effect::Spawn(LetterOfCredit))
            .rule(PurchaseOrder, Issued, Buyer, Amend, Effect::MoveTo(Issued))
            .rule(PurchaseOrder, Issued, Buyer, Cancel, Effect::MoveTo(Cancelled))
            // Letter of Credit
            .rule(LetterOfCredit, Issued, Auditor, Verify, Effect::MoveTo(Verified))
            .rule(LetterOfCredit, Issued, Bank, Cancel, Effect::MoveTo(Cancelled))
            // Bill of Lading
            .rule(BillOfLading, Issued, Seller, Ship, Effect::MoveTo(Shipped))
            .rule(BillOfLading, Shipped, Buyer, Receive, Effect::MoveTo(Received))
            .rule(BillOfLading, Received, Auditor, Verify, Effect::MoveTo(Verified))
            // Invoice
            .rule(Invoice, Issued, Bank, Pay, Effect::MoveTo(Paid))
            .rule(Invoice, Issued, Seller, Amend, Effect::MoveTo(Issued))
            .rule(Invoice, Issued, Seller, Cancel, Effect::MoveTo(Cancelled))
            // Certificates
            .rule(CertificateOfOrigin, Issued, Auditor, Verify, Effect::MoveTo(Verified))
            .rule(InsuranceCertificate, Issued, Auditor, Verify, Effect::MoveTo(Verified))
            // Terminal statuses
            .terminal(PurchaseOrder, Verified)
            .terminal(PurchaseOrder, Cancelled)
            .terminal(LetterOfCredit, Verified)
            .terminal(LetterOfCredit, Cancelled)
            .terminal(BillOfLading, Verified)
            .terminal(Invoice, Paid)
            .terminal(Invoice, Cancelled)
            .terminal(CertificateOfOrigin, Verified)
            .terminal(InsuranceCertificate, Verified)
            .build()
    }

    /// Pure lookup: actions `role` may take on a `doc_type` document in
    /// `status`. Empty when nothing applies (terminal status or a role with
    /// nothing to do there).
    pub fn allowed_actions(&self, doc_type: DocType, status: DocStatus, role: Role) -> Vec<Action> {
        self.rules
            .get(&(doc_type, status, role))
            .map(|entries| entries.iter().map(|(action, _)| *action).collect())
            .unwrap_or_default()
    }

    /// Resolve the effect of `action` for the given state, if permitted.
    pub fn resolve(
        &self,
        doc_type: DocType,
        status: DocStatus,
        role: Role,
        action: Action,
    ) -> Option<Effect> {
        self.rules
            .get(&(doc_type, status, role))
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|(a, _)| *a == action)
                    .map(|(_, effect)| *effect)
            })
    }
}

/// Accumulates rules and terminal declarations, validating on `build`.
#[derive(Debug, Default)]
pub struct TransitionTableBuilder {
    rules: Vec<TransitionRule>,
    terminals: HashSet<(DocType, DocStatus)>,
}

impl TransitionTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule.
    pub fn rule(
        mut self,
        doc_type: DocType,
        from: DocStatus,
        role: Role,
        action: Action,
        effect: Effect,
    ) -> Self {
        self.rules.push(TransitionRule {
            doc_type,
            from,
            role,
            action,
            effect,
        });
        self
    }

    /// Declare a status terminal for a type: reachable, with no further
    /// actions by design.
    pub fn terminal(mut self, doc_type: DocType, status: DocStatus) -> Self {
        self.terminals.insert((doc_type, status));
        self
    }

    /// Validate and build the table.
    pub fn build(self) -> Result<TransitionTable, TableError> {
        self.validate()?;

        let mut rules: HashMap<(DocType, DocStatus, Role), Vec<(Action, Effect)>> = HashMap::new();
        for rule in &self.rules {
            rules
                .entry((rule.doc_type, rule.from, rule.role))
                .or_default()
                .push((rule.action, rule.effect));
        }
        Ok(TransitionTable { rules })
    }

    fn validate(&self) -> Result<(), TableError> {
        // Duplicates.
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert((rule.doc_type, rule.from, rule.role, rule.action)) {
                return Err(TableError::DuplicateRule {
                    doc_type: rule.doc_type,
                    from: rule.from,
                    role: rule.role,
                    action: rule.action,
                });
            }
        }

        // Statuses with rules, per type.
        let mut has_rules: HashMap<DocType, HashSet<DocStatus>> = HashMap::new();
        for rule in &self.rules {
            has_rules.entry(rule.doc_type).or_default().insert(rule.from);
        }

        // Dangling targets: every MoveTo must land on a status that either
        // has rules or is declared terminal.
        for rule in &self.rules {
            if let Effect::MoveTo(target) = rule.effect {
                let known = has_rules
                    .get(&rule.doc_type)
                    .map(|s| s.contains(&target))
                    .unwrap_or(false)
                    || self.terminals.contains(&(rule.doc_type, target));
                if !known {
                    return Err(TableError::DanglingTarget {
                        doc_type: rule.doc_type,
                        action: rule.action,
                        target,
                    });
                }
            }
        }

        // Reachability: every from-status must be reachable from the type's
        // initial status through MoveTo targets.
        for (doc_type, statuses) in &has_rules {
            let initial = doc_type.initial_status();
            let mut reachable: HashSet<DocStatus> = HashSet::new();
            reachable.insert(initial);
            let mut changed = true;
            while changed {
                changed = false;
                for rule in self.rules.iter().filter(|r| r.doc_type == *doc_type) {
                    if reachable.contains(&rule.from) {
                        if let Effect::MoveTo(target) = rule.effect {
                            changed |= reachable.insert(target);
                        }
                    }
                }
            }
            for status in statuses {
                if !reachable.contains(status) {
                    return Err(TableError::UnreachableStatus {
                        doc_type: *doc_type,
                        status: *status,
                        initial,
                    });
                }
            }
        }

        Ok(())
    }
}
