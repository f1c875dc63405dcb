//! Repository layer: persistence client and record repository.
//!
//! # Responsibility
//! - Define the store-facing contract (`RecordStore`) and its SQLite backend.
//! - Interpret store results into domain outcomes (`RecordRepository`).
//!
//! # Invariants
//! - Repository writes must call `RecordInput::validate()` before persistence.
//! - Repository APIs return semantic errors (`DuplicateVin`, `NotFound`) in
//!   addition to store transport errors.

pub mod record_repo;
pub mod record_store;
