//! # Shared Types Crate
//!
//! Domain entities and identifiers shared across the TradeLedger subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Explicit Identity**: Every call into the core carries an [`Actor`];
//!   no subsystem reads ambient session state.
//! - **Typed Keys**: Document types, statuses, and roles are enums, never
//!   free-form strings, so a typo is a compile error rather than a silent
//!   no-op lookup.

pub mod entities;
pub mod ids;
pub mod time;

pub use entities::*;
pub use ids::*;
pub use time::{SystemTimeSource, TimeSource, Timestamp};
