//! Domain model for the train handler: status enums, the run-status
//! reduction, callback authorization rules, and artifact hashing.
//!
//! This crate performs no I/O. Everything here is exercised by the
//! ingestion and dispatch layers in `trainhub-api`.

pub mod error;
pub mod hashing;
pub mod status;
pub mod transition;

/// Per-entity logical clock. Bumped by one on every status-affecting
/// write; strictly increasing for a given Run or Job.
pub type Version = i64;
