//! # Ledger Errors
//!
//! Durability and serialization failures surfaced by ledger stores. There is
//! no "entry rejected" variant: a well-formed append only fails if the
//! backing storage does.

use thiserror::Error;

/// Errors surfaced by a [`crate::LedgerStore`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Backing storage could not be read or written.
    #[error("ledger I/O error: {message}")]
    Io {
        /// Underlying error description.
        message: String,
    },

    /// An entry could not be encoded or decoded.
    #[error("ledger serialization error: {message}")]
    Serialization {
        /// Underlying error description.
        message: String,
    },
}

impl LedgerError {
    pub(crate) fn io(err: impl std::fmt::Display) -> Self {
        LedgerError::Io {
            message: err.to_string(),
        }
    }

    pub(crate) fn serialization(err: impl std::fmt::Display) -> Self {
        LedgerError::Serialization {
            message: err.to_string(),
        }
    }
}
