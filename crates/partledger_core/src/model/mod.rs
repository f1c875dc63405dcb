//! Domain model for vehicle/client records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep normalization and validation next to the data they guard.
//!
//! # Invariants
//! - Every record is identified by a stable store-assigned `RecordId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod record;
