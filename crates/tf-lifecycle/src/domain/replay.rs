//! # Ledger Replay
//!
//! Recomputes a document's status by replaying its ordered ledger entries
//! through the transition table from the type's initial status. Makes the
//! consistency between `Document.status` and the ledger history a checkable
//! property rather than an assumption.

use crate::domain::transitions::{Action, Effect, TransitionTable};
use shared_types::{DocStatus, DocType, Role};
use tf_ledger::{LedgerAction, LedgerEntry};

/// Why a history failed to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalEntry {
    /// Sequence number of the offending entry.
    pub seq: u64,
    /// Its recorded action.
    pub action: LedgerAction,
    /// Role snapshot it carried.
    pub role: Role,
    /// Status the replay had reached when it hit the entry.
    pub at: DocStatus,
}

/// Replay `entries` (already ordered, as returned by the ledger store) for
/// a document of `doc_type`, returning the resulting status.
///
/// `Issued` entries record creation/spawning and `IntegrityAlert` entries
/// record checker outcomes; neither moves the document, so both are skipped.
/// A `Spawn` effect found during replay likewise leaves the status in place.
pub fn replay_status(
    table: &TransitionTable,
    doc_type: DocType,
    entries: &[LedgerEntry],
) -> Result<DocStatus, IllegalEntry> {
    let mut status = doc_type.initial_status();

    for entry in entries {
        let Some(action) = Action::from_ledger_action(entry.action) else {
            continue;
        };
        // The table that accepted the entry must still accept it on replay.
        match table.resolve(doc_type, status, entry.actor_role, action) {
            Some(Effect::MoveTo(target)) => status = target,
            Some(Effect::Spawn(_)) => {}
            None => {
                return Err(IllegalEntry {
                    seq: entry.seq,
                    action: entry.action,
                    role: entry.actor_role,
                    at: status,
                })
            }
        }
    }

    Ok(status)
}
