//! # Identifiers
//!
//! UUID-backed newtype identifiers for the core entities. Newtypes keep a
//! `DocumentId` from being passed where an `ActorId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a tracked document.
    DocumentId
);

id_newtype!(
    /// Identifier of an appended ledger entry.
    LedgerEntryId
);

id_newtype!(
    /// Identifier of an integrity alert.
    AlertId
);

id_newtype!(
    /// Identifier of an integrity check result row.
    CheckResultId
);

id_newtype!(
    /// Identifier of a trade transaction linking documents between parties.
    TransactionId
);

id_newtype!(
    /// Identifier of an actor (user or system worker).
    ActorId
);

impl ActorId {
    /// The reserved identity used when the system itself (e.g. the
    /// integrity worker) appends ledger entries.
    pub fn system() -> Self {
        Self(Uuid::nil())
    }

    /// True for the reserved system identity.
    pub fn is_system(&self) -> bool {
        self.0.is_nil()
    }
}
