//! In-memory parts row editor.
//!
//! # Responsibility
//! - Hold the working list of part rows for the create and edit forms.
//! - Turn the rows into validated `PartEntry` values on submit.
//!
//! # Invariants
//! - Rows are stored as one list, so add/remove always move name, serial and
//!   price together; `columns()` views are equal length at every step.
//! - Create mode never drops below one row.
//! - `to_part_entries` does not mutate the editor.

use crate::model::record::{PartEntry, ValidationError};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const NEW_ROW_PRICE: &str = "0";

/// Which form flow owns the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// New record form: at least one row and one submitted part.
    Create,
    /// Existing record form: rows may be removed down to zero.
    Edit,
}

/// Editable field of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartField {
    Name,
    SerialNumber,
    Price,
}

/// One editable row; every field is raw user text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDraft {
    pub name: String,
    pub serial_number: String,
    pub price: String,
}

impl PartDraft {
    pub fn new(
        name: impl Into<String>,
        serial_number: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            serial_number: serial_number.into(),
            price: price.into(),
        }
    }

    fn empty() -> Self {
        Self {
            name: String::new(),
            serial_number: String::new(),
            price: NEW_ROW_PRICE.to_string(),
        }
    }

    fn from_entry(entry: &PartEntry) -> Self {
        Self {
            name: entry.name.clone(),
            serial_number: entry.serial_number.clone(),
            price: entry
                .price
                .map_or_else(|| NEW_ROW_PRICE.to_string(), |price| price.to_string()),
        }
    }

    fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.serial_number.trim().is_empty()
    }
}

/// Parallel column views over the editor rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftColumns<'a> {
    pub names: Vec<&'a str>,
    pub serials: Vec<&'a str>,
    pub prices: Vec<&'a str>,
}

/// Editor misuse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Index does not refer to a rendered row.
    RowOutOfRange { index: usize, len: usize },
    /// Create mode must keep at least one row.
    LastRowRequired,
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowOutOfRange { index, len } => {
                write!(f, "part row {index} out of range (rows: {len})")
            }
            Self::LastRowRequired => write!(f, "the last part row cannot be removed"),
        }
    }
}

impl Error for EditorError {}

/// Working list of part rows shared by the create and edit flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartsEditor {
    mode: EditorMode,
    rows: Vec<PartDraft>,
}

impl PartsEditor {
    /// Editor for a new record, starting with one empty row.
    pub fn new_create() -> Self {
        Self {
            mode: EditorMode::Create,
            rows: vec![PartDraft::empty()],
        }
    }

    /// Create-mode editor holding exactly `draft`, as in the add-part dialog.
    pub fn single_row(draft: PartDraft) -> Self {
        Self {
            mode: EditorMode::Create,
            rows: vec![draft],
        }
    }

    /// Editor for an existing record, one row per stored part.
    ///
    /// A missing stored price is shown as `0`.
    pub fn from_parts(parts: &[PartEntry]) -> Self {
        Self {
            mode: EditorMode::Edit,
            rows: parts.iter().map(PartDraft::from_entry).collect(),
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn rows(&self) -> &[PartDraft] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Name, serial and price views, index-aligned.
    pub fn columns(&self) -> DraftColumns<'_> {
        DraftColumns {
            names: self.rows.iter().map(|row| row.name.as_str()).collect(),
            serials: self
                .rows
                .iter()
                .map(|row| row.serial_number.as_str())
                .collect(),
            prices: self.rows.iter().map(|row| row.price.as_str()).collect(),
        }
    }

    /// Appends one empty row.
    pub fn add_row(&mut self) {
        self.rows.push(PartDraft::empty());
    }

    /// Removes one row with all of its fields.
    ///
    /// # Errors
    /// - `RowOutOfRange` when `index` is not a current row.
    /// - `LastRowRequired` when this would empty a create-mode editor.
    pub fn remove_row(&mut self, index: usize) -> Result<PartDraft, EditorError> {
        self.check_index(index)?;
        if self.mode == EditorMode::Create && self.rows.len() == 1 {
            return Err(EditorError::LastRowRequired);
        }
        Ok(self.rows.remove(index))
    }

    /// Replaces one field of one row, leaving everything else untouched.
    pub fn update_field(
        &mut self,
        index: usize,
        field: PartField,
        value: impl Into<String>,
    ) -> Result<(), EditorError> {
        self.check_index(index)?;
        let row = &mut self.rows[index];
        let value = value.into();
        match field {
            PartField::Name => row.name = value,
            PartField::SerialNumber => row.serial_number = value,
            PartField::Price => row.price = value,
        }
        Ok(())
    }

    /// Produces normalized part entries for submission.
    ///
    /// Rows whose trimmed name and serial are both empty are dropped. Every
    /// other row must have a name, a serial and a parsable non-negative
    /// price; the first offending row is reported with its 1-based position.
    /// Create mode additionally rejects an empty result.
    pub fn to_part_entries(&self) -> Result<Vec<PartEntry>, ValidationError> {
        let mut entries = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            if row.is_blank() {
                continue;
            }
            let position = idx + 1;
            let name = row.name.trim();
            let serial_number = row.serial_number.trim();
            if name.is_empty() {
                return Err(ValidationError::MissingPartName { position });
            }
            if serial_number.is_empty() {
                return Err(ValidationError::MissingSerialNumber { position });
            }
            let price = parse_price(&row.price, position)?;
            entries.push(PartEntry::new(name, serial_number, price));
        }

        if entries.is_empty() && self.mode == EditorMode::Create {
            return Err(ValidationError::NoParts);
        }
        Ok(entries)
    }

    fn check_index(&self, index: usize) -> Result<(), EditorError> {
        if index >= self.rows.len() {
            return Err(EditorError::RowOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(())
    }
}

/// Parses user price text into a non-negative decimal.
///
/// Accepts plain decimals and scientific notation (`1e3`).
pub fn parse_price(raw: &str, position: usize) -> Result<Decimal, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingPrice { position });
    }
    let parsed = if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed)
    } else {
        Decimal::from_str(trimmed)
    };
    let price = parsed.map_err(|_| ValidationError::InvalidPrice {
        position,
        value: trimmed.to_string(),
    })?;
    if price < Decimal::ZERO {
        return Err(ValidationError::NegativePrice { position });
    }
    Ok(price.normalize())
}

#[cfg(test)]
mod tests {
    use super::{parse_price, EditorError, EditorMode, PartDraft, PartField, PartsEditor};
    use crate::model::record::ValidationError;
    use rust_decimal::Decimal;

    #[test]
    fn parse_price_accepts_decimal_and_scientific_text() {
        assert_eq!(parse_price(" 10.50 ", 1).unwrap(), Decimal::new(105, 1));
        assert_eq!(parse_price("1e3", 1).unwrap(), Decimal::new(1000, 0));
    }

    #[test]
    fn parse_price_rejects_text_and_negative_values() {
        assert_eq!(
            parse_price("abc", 2).unwrap_err(),
            ValidationError::InvalidPrice {
                position: 2,
                value: "abc".to_string()
            }
        );
        assert_eq!(
            parse_price("-5", 4).unwrap_err(),
            ValidationError::NegativePrice { position: 4 }
        );
        assert_eq!(
            parse_price("  ", 1).unwrap_err(),
            ValidationError::MissingPrice { position: 1 }
        );
    }

    #[test]
    fn update_field_out_of_range_is_reported() {
        let mut editor = PartsEditor::new_create();
        let err = editor
            .update_field(3, PartField::Name, "Filtru")
            .unwrap_err();
        assert_eq!(err, EditorError::RowOutOfRange { index: 3, len: 1 });
    }

    #[test]
    fn single_row_editor_validates_the_given_draft() {
        let editor = PartsEditor::single_row(PartDraft::new(" Bujie ", "NGK", "12.50"));
        assert_eq!(editor.mode(), EditorMode::Create);
        assert_eq!(editor.len(), 1);
        let parts = editor.to_part_entries().unwrap();
        assert_eq!(parts[0].name, "Bujie");
        assert_eq!(parts[0].price, Some(Decimal::new(125, 1)));

        let blank = PartsEditor::single_row(PartDraft::new("", " ", "0"));
        assert_eq!(blank.to_part_entries().unwrap_err(), ValidationError::NoParts);
    }

    #[test]
    fn new_row_defaults_price_to_zero() {
        let editor = PartsEditor::new_create();
        assert_eq!(editor.rows()[0].price, "0");
        assert!(editor.rows()[0].name.is_empty());
    }
}
