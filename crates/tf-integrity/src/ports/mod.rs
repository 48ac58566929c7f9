//! Port traits the host application implements for the integrity subsystem.

pub mod outbound;
