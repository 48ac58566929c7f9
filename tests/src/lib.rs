//! # TradeLedger Test Suite
//!
//! Unified test crate for cross-subsystem scenarios.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── helpers.rs        # Full-stack fixture and recording notifier
//!     ├── trade_flow.rs     # Lifecycle scenarios across the ledger
//!     └── integrity_flow.rs # Tamper/missing-file detection scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All integration scenarios
//! cargo test -p tf-tests
//!
//! # By module
//! cargo test -p tf-tests integration::trade_flow
//! cargo test -p tf-tests integration::integrity_flow
//! ```

pub mod integration;
