//! Record use-case service and form-level validation.
//!
//! # Responsibility
//! - Hold the create/edit form state and validate it before any store call.
//! - Offer one entry point per user action (submit, search, part edits,
//!   delete, export).
//!
//! # Invariants
//! - Form validation fails fast; an invalid form never reaches the repository.
//! - Blank search text is rejected locally instead of matching everything.

use crate::editor::parts_editor::{PartDraft, PartsEditor};
use crate::model::record::{Record, RecordId, RecordInput, ValidationError};
use crate::report::renderer::{ReportConfig, ReportRenderer};
use crate::report::writer::DocumentWriter;
use crate::repo::record_repo::{Lookup, RecordRepository, RepoError};
use crate::repo::record_store::RecordStore;
use chrono::NaiveDateTime;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

pub type SubmitResult<T> = Result<T, SubmitError>;

/// Failure of a user action, split by where it was detected.
#[derive(Debug)]
pub enum SubmitError {
    /// Rejected before the repository was called.
    Validation(ValidationError),
    Repo(RepoError),
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for SubmitError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for SubmitError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Raw create/edit form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordForm {
    pub vin_number: String,
    pub license_plate: String,
    pub client_name: String,
    pub notes: String,
    pub parts: PartsEditor,
}

impl RecordForm {
    /// Empty form for a new record.
    pub fn new_create() -> Self {
        Self {
            vin_number: String::new(),
            license_plate: String::new(),
            client_name: String::new(),
            notes: String::new(),
            parts: PartsEditor::new_create(),
        }
    }

    /// Form pre-filled from a stored record, parts editor in edit mode.
    pub fn from_record(record: &Record) -> Self {
        Self {
            vin_number: record.vin_number.clone(),
            license_plate: record.license_plate.clone().unwrap_or_default(),
            client_name: record.client_name.clone(),
            notes: record.notes.clone().unwrap_or_default(),
            parts: PartsEditor::from_parts(&record.parts),
        }
    }

    /// Checks the form and returns normalized repository input.
    ///
    /// Field order: VIN present, client name present, part rows, then the
    /// length limits of the normalized input.
    pub fn validate(&self) -> Result<RecordInput, ValidationError> {
        if self.vin_number.trim().is_empty() {
            return Err(ValidationError::MissingVin);
        }
        if self.client_name.trim().is_empty() {
            return Err(ValidationError::MissingClientName);
        }
        let parts = self.parts.to_part_entries()?;

        let input = RecordInput {
            vin_number: self.vin_number.clone(),
            license_plate: Some(self.license_plate.clone()),
            client_name: self.client_name.clone(),
            notes: Some(self.notes.clone()),
            parts,
        }
        .normalized();
        input.validate()?;
        Ok(input)
    }
}

/// Use-case facade over the record repository and report renderer.
pub struct RecordService<S: RecordStore> {
    repo: RecordRepository<S>,
    renderer: ReportRenderer,
}

impl<S: RecordStore> RecordService<S> {
    pub fn new(store: S, report: ReportConfig) -> Self {
        Self {
            repo: RecordRepository::new(store),
            renderer: ReportRenderer::new(report),
        }
    }

    pub fn repository(&self) -> &RecordRepository<S> {
        &self.repo
    }

    pub fn renderer(&self) -> &ReportRenderer {
        &self.renderer
    }

    /// Validates a create form and persists it.
    pub fn submit_create(&self, form: &RecordForm) -> SubmitResult<Record> {
        let input = form.validate()?;
        Ok(self.repo.create(&input)?)
    }

    /// Validates an edit form and replaces the stored record.
    pub fn submit_update(&self, id: RecordId, form: &RecordForm) -> SubmitResult<Record> {
        let input = form.validate()?;
        Ok(self.repo.update(id, &input)?)
    }

    pub fn search_by_vin(&self, query: &str) -> SubmitResult<Lookup<Record>> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptySearchQuery.into());
        }
        Ok(self.repo.find_by_vin(query)?)
    }

    pub fn search_by_plate(&self, query: &str) -> SubmitResult<Lookup<Vec<Record>>> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptySearchQuery.into());
        }
        Ok(self.repo.find_by_plate(query)?)
    }

    /// Appends one part typed into the single-row add-part dialog.
    pub fn add_part(
        &self,
        id: RecordId,
        name: &str,
        serial_number: &str,
        price: &str,
    ) -> SubmitResult<Record> {
        let dialog = PartsEditor::single_row(PartDraft::new(name, serial_number, price));
        // An all-blank dialog reports the missing name.
        let part = match dialog.to_part_entries() {
            Ok(mut parts) if !parts.is_empty() => parts.remove(0),
            Ok(_) | Err(ValidationError::NoParts) => {
                return Err(ValidationError::MissingPartName { position: 1 }.into())
            }
            Err(err) => return Err(err.into()),
        };
        Ok(self.repo.append_part(id, &part)?)
    }

    /// Removes the part at `index` as displayed (0-based).
    pub fn remove_part(&self, id: RecordId, index: usize) -> SubmitResult<Record> {
        let (record, _removed) = self.repo.remove_part(id, index)?;
        Ok(record)
    }

    /// Deletes a record; `Ok(false)` when it was already gone.
    pub fn delete(&self, id: RecordId) -> SubmitResult<bool> {
        Ok(self.repo.delete(id)?)
    }

    /// Re-reads a record after a failed write so the caller can resync.
    pub fn refresh(&self, id: RecordId) -> SubmitResult<Lookup<Record>> {
        Ok(self.repo.get(id)?)
    }

    /// Renders `record` into `writer` and saves it under `out_dir`.
    pub fn export_report<W: DocumentWriter>(
        &self,
        record: &Record,
        writer: &mut W,
        out_dir: &Path,
        generated_at: NaiveDateTime,
    ) -> io::Result<PathBuf> {
        self.renderer.render(record, generated_at, writer);
        let file_stem = self.renderer.file_name(record, generated_at.date());
        let path = writer.save(out_dir, &file_stem)?;
        info!(
            "event=report_export module=service status=ok record_id={} pages={}",
            record.id,
            writer.page_count()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::RecordForm;
    use crate::editor::parts_editor::PartField;
    use crate::model::record::ValidationError;

    fn filled_form() -> RecordForm {
        let mut form = RecordForm::new_create();
        form.vin_number = " 1hgcm82633a004352 ".to_string();
        form.client_name = "Ion Popescu".to_string();
        form.parts.update_field(0, PartField::Name, "Filtru").unwrap();
        form.parts
            .update_field(0, PartField::SerialNumber, "F-1")
            .unwrap();
        form.parts.update_field(0, PartField::Price, "10").unwrap();
        form
    }

    #[test]
    fn validate_normalizes_input() {
        let input = filled_form().validate().unwrap();
        assert_eq!(input.vin_number, "1HGCM82633A004352");
        assert_eq!(input.license_plate, None);
        assert_eq!(input.notes, None);
        assert_eq!(input.parts.len(), 1);
    }

    #[test]
    fn validate_reports_missing_vin_first() {
        let mut form = filled_form();
        form.vin_number = "   ".to_string();
        form.client_name.clear();
        assert_eq!(form.validate().unwrap_err(), ValidationError::MissingVin);
    }

    #[test]
    fn validate_reports_long_vin_after_parts() {
        let mut form = filled_form();
        form.vin_number = "1HGCM82633A004352X".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::VinTooLong { len: 18 }
        );
    }
}
