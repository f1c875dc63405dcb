//! Record repository: normalization, conflict detection and part helpers.
//!
//! # Responsibility
//! - Translate validated record input into `RecordStore` calls.
//! - Own all interpretation of store failures (`DuplicateVin`, `NotFound`).
//! - Provide read-modify-write helpers to append or remove a single part.
//!
//! # Invariants
//! - Every write normalizes and re-validates its input first.
//! - `create` rejects an empty parts list; `update` and `remove_part` accept it.
//! - Parts are always handed to the store as one `PartColumns` value, so the
//!   three stored sequences change together.
//!
//! # Known limitation
//! `append_part`/`remove_part` read the record, change its parts and write
//! them back in two store calls. A concurrent writer to the same record can
//! interleave and the last write wins. There is no version token.

use crate::model::record::{
    normalize_plate, normalize_vin, PartColumns, PartEntry, Record, RecordId, RecordInput,
    ValidationError,
};
use crate::repo::record_store::{RecordRow, RecordStore, StoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Outcome of a lookup where "nothing matched" is expected, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Converts into an `Option`, dropping the not-found marker.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

/// What could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    Record(RecordId),
    /// Part index is outside the record's current parts (stale caller view).
    PartIndex {
        record_id: RecordId,
        index: usize,
        len: usize,
    },
}

impl Display for NotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Record(id) => write!(f, "record not found: {id}"),
            Self::PartIndex {
                record_id,
                index,
                len,
            } => write!(
                f,
                "part index {index} not found on record {record_id} (parts: {len})"
            ),
        }
    }
}

/// Repository failure surfaced to callers.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    /// Another record already holds this VIN.
    DuplicateVin(String),
    NotFound(NotFound),
    /// Any other store fault; the message is meant for display.
    Store(StoreError),
}

impl RepoError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::DuplicateVin(_) => "duplicate_vin",
            Self::NotFound(_) => "not_found",
            Self::Store(_) => "store_failure",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateVin(vin) => write!(f, "VIN number {vin} already exists in the system"),
            Self::NotFound(what) => write!(f, "{what}"),
            Self::Store(err) => write!(f, "database error: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::DuplicateVin(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<NotFound> for RepoError {
    fn from(value: NotFound) -> Self {
        Self::NotFound(value)
    }
}

/// Stateless record repository over a persistence client.
pub struct RecordRepository<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> RecordRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Inserts a new record and returns it as persisted.
    ///
    /// # Errors
    /// - `Validation` for invalid fields or an empty parts list.
    /// - `DuplicateVin` when the VIN is already used (case-insensitive).
    /// - `Store` for any other store failure.
    pub fn create(&self, input: &RecordInput) -> RepoResult<Record> {
        let started_at = Instant::now();
        let result = self.create_inner(input);
        log_outcome("record_create", started_at, &result);
        result
    }

    /// Exact VIN lookup after trim and upper-casing.
    pub fn find_by_vin(&self, vin: &str) -> RepoResult<Lookup<Record>> {
        let started_at = Instant::now();
        let vin = normalize_vin(vin);
        let result = self
            .store
            .select_by_vin(&vin)
            .map(|found| found.map_or(Lookup::NotFound, Lookup::Found))
            .map_err(RepoError::from);
        log_lookup("record_find_vin", started_at, &result);
        result
    }

    /// Case-insensitive plate pattern lookup, newest record first.
    ///
    /// `%` and `_` in the query act as `LIKE` wildcards.
    pub fn find_by_plate(&self, plate: &str) -> RepoResult<Lookup<Vec<Record>>> {
        let started_at = Instant::now();
        let pattern = normalize_plate(plate).unwrap_or_default();
        let result = self
            .store
            .select_by_plate_pattern(&pattern)
            .map(|records| {
                if records.is_empty() {
                    Lookup::NotFound
                } else {
                    Lookup::Found(records)
                }
            })
            .map_err(RepoError::from);
        log_lookup("record_find_plate", started_at, &result);
        result
    }

    /// Fetches one record by id, used to resynchronise after a failed write.
    pub fn get(&self, id: RecordId) -> RepoResult<Lookup<Record>> {
        Ok(self
            .store
            .select_by_id(id)?
            .map_or(Lookup::NotFound, Lookup::Found))
    }

    /// Replaces every mutable field of an existing record.
    ///
    /// An empty parts list is accepted here.
    pub fn update(&self, id: RecordId, input: &RecordInput) -> RepoResult<Record> {
        let started_at = Instant::now();
        let result = self.update_inner(id, input);
        log_outcome("record_update", started_at, &result);
        result
    }

    /// Appends one part to the end of the record's parts.
    pub fn append_part(&self, id: RecordId, part: &PartEntry) -> RepoResult<Record> {
        let started_at = Instant::now();
        let result = self.append_part_inner(id, part);
        log_outcome("record_append_part", started_at, &result);
        result
    }

    /// Removes the part at `index` and returns the updated record with the
    /// removed entry.
    pub fn remove_part(&self, id: RecordId, index: usize) -> RepoResult<(Record, PartEntry)> {
        let started_at = Instant::now();
        let result = self.remove_part_inner(id, index);
        log_outcome("record_remove_part", started_at, &result);
        result
    }

    /// Hard-deletes a record.
    ///
    /// Idempotent: deleting an unknown id succeeds with `Ok(false)`.
    pub fn delete(&self, id: RecordId) -> RepoResult<bool> {
        let started_at = Instant::now();
        let result = self.store.delete(id).map_err(RepoError::from);
        match &result {
            Ok(deleted) => info!(
                "event=record_delete module=repo status=ok record_id={id} deleted={deleted} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("record_delete", started_at, err),
        }
        result
    }

    fn create_inner(&self, input: &RecordInput) -> RepoResult<Record> {
        let normalized = input.normalized();
        normalized.validate()?;
        if normalized.parts.is_empty() {
            return Err(ValidationError::NoParts.into());
        }

        let row = to_row(&normalized);
        let id = self
            .store
            .insert(&row)
            .map_err(|err| interpret_write_error(err, &normalized.vin_number))?;
        self.store.select_by_id(id)?.ok_or_else(|| {
            StoreError::InvalidData(format!("created record {id} missing on read-back")).into()
        })
    }

    fn update_inner(&self, id: RecordId, input: &RecordInput) -> RepoResult<Record> {
        let normalized = input.normalized();
        normalized.validate()?;

        let row = to_row(&normalized);
        let changed = self
            .store
            .update_row(id, &row)
            .map_err(|err| interpret_write_error(err, &normalized.vin_number))?;
        if !changed {
            return Err(NotFound::Record(id).into());
        }
        self.load(id)
    }

    fn append_part_inner(&self, id: RecordId, part: &PartEntry) -> RepoResult<Record> {
        let mut record = self.load(id)?;
        let part = part.normalized();
        part.validate(record.parts.len() + 1)?;

        record.parts.push(part);
        self.write_parts(id, &record.parts)?;
        self.load(id)
    }

    fn remove_part_inner(&self, id: RecordId, index: usize) -> RepoResult<(Record, PartEntry)> {
        let mut record = self.load(id)?;
        if index >= record.parts.len() {
            return Err(NotFound::PartIndex {
                record_id: id,
                index,
                len: record.parts.len(),
            }
            .into());
        }

        let removed = record.parts.remove(index);
        self.write_parts(id, &record.parts)?;
        Ok((self.load(id)?, removed))
    }

    fn write_parts(&self, id: RecordId, parts: &[PartEntry]) -> RepoResult<()> {
        if !self
            .store
            .update_parts(id, &PartColumns::from_entries(parts))?
        {
            return Err(NotFound::Record(id).into());
        }
        Ok(())
    }

    fn load(&self, id: RecordId) -> RepoResult<Record> {
        self.store
            .select_by_id(id)?
            .ok_or_else(|| NotFound::Record(id).into())
    }
}

fn to_row(input: &RecordInput) -> RecordRow {
    RecordRow {
        vin_number: input.vin_number.clone(),
        license_plate: input.license_plate.clone(),
        client_name: input.client_name.clone(),
        notes: input.notes.clone(),
        parts: PartColumns::from_entries(&input.parts),
    }
}

fn interpret_write_error(err: StoreError, vin: &str) -> RepoError {
    match err {
        StoreError::UniqueViolation { .. } => RepoError::DuplicateVin(vin.to_string()),
        other => RepoError::Store(other),
    }
}

fn log_outcome<T>(event: &str, started_at: Instant, result: &RepoResult<T>) {
    match result {
        Ok(_) => info!(
            "event={event} module=repo status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => log_failure(event, started_at, err),
    }
}

fn log_lookup<T>(event: &str, started_at: Instant, result: &RepoResult<Lookup<T>>) {
    match result {
        Ok(Lookup::Found(_)) => info!(
            "event={event} module=repo status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Ok(Lookup::NotFound) => info!(
            "event={event} module=repo status=not_found duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => log_failure(event, started_at, err),
    }
}

fn log_failure(event: &str, started_at: Instant, err: &RepoError) {
    let duration_ms = started_at.elapsed().as_millis();
    let error_code = err.code();
    match err {
        RepoError::NotFound(_) => info!(
            "event={event} module=repo status=not_found duration_ms={duration_ms} error={err}"
        ),
        RepoError::Validation(_) | RepoError::DuplicateVin(_) => warn!(
            "event={event} module=repo status=rejected duration_ms={duration_ms} error_code={error_code} error={err}"
        ),
        RepoError::Store(_) => error!(
            "event={event} module=repo status=error duration_ms={duration_ms} error_code={error_code} error={err}"
        ),
    }
}
