//! Record domain model.
//!
//! # Responsibility
//! - Define the vehicle/client record and its purchased part entries.
//! - Own field normalization and validation rules shared by every write path.
//! - Convert between the single `parts` list and the three parallel
//!   storage sequences.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused for another record.
//! - In memory, `parts` is one ordered list; the parallel-sequence shape only
//!   exists in `PartColumns` at the persistence boundary.
//! - `PartColumns::from_entries` always yields three sequences of equal length.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a persisted record.
pub type RecordId = Uuid;

/// Maximum VIN length in characters.
pub const VIN_MAX_CHARS: usize = 17;
/// Maximum license plate length in characters.
pub const PLATE_MAX_CHARS: usize = 10;

/// One purchased part: name, serial number and price.
///
/// `price` is `None` only for legacy rows whose price sequence is shorter
/// than the name sequence. Write paths always carry `Some(price)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartEntry {
    pub name: String,
    pub serial_number: String,
    pub price: Option<Decimal>,
}

impl PartEntry {
    /// Creates a priced part entry.
    pub fn new(name: impl Into<String>, serial_number: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            serial_number: serial_number.into(),
            price: Some(price),
        }
    }

    /// Returns a copy with surrounding whitespace removed from text fields.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            serial_number: self.serial_number.trim().to_string(),
            price: self.price,
        }
    }

    /// Validates this entry for persistence.
    ///
    /// `position` is the 1-based row number used in error messages.
    pub fn validate(&self, position: usize) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingPartName { position });
        }
        if self.serial_number.trim().is_empty() {
            return Err(ValidationError::MissingSerialNumber { position });
        }
        match self.price {
            None => Err(ValidationError::MissingPrice { position }),
            Some(price) if price < Decimal::ZERO => {
                Err(ValidationError::NegativePrice { position })
            }
            Some(_) => Ok(()),
        }
    }
}

/// Persisted vehicle/client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned stable id.
    pub id: RecordId,
    /// Upper-cased VIN, unique across records.
    pub vin_number: String,
    /// Upper-cased plate; `None` when not provided.
    pub license_plate: Option<String>,
    pub client_name: String,
    pub notes: Option<String>,
    /// Ordered purchased parts.
    pub parts: Vec<PartEntry>,
    /// Unix epoch milliseconds, set once at insert.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by every write.
    pub updated_at: i64,
}

impl Record {
    /// Sum of all part prices; missing prices count as zero.
    pub fn total_price(&self) -> Decimal {
        self.parts
            .iter()
            .filter_map(|part| part.price)
            .fold(Decimal::ZERO, |sum, price| sum + price)
    }

    /// Returns the parallel-sequence storage view of `parts`.
    pub fn part_columns(&self) -> PartColumns {
        PartColumns::from_entries(&self.parts)
    }

    /// Rebuilds the editable input shape from this record.
    pub fn to_input(&self) -> RecordInput {
        RecordInput {
            vin_number: self.vin_number.clone(),
            license_plate: self.license_plate.clone(),
            client_name: self.client_name.clone(),
            notes: self.notes.clone(),
            parts: self.parts.clone(),
        }
    }
}

/// Caller-provided record fields for create and whole-record update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordInput {
    pub vin_number: String,
    pub license_plate: Option<String>,
    pub client_name: String,
    pub notes: Option<String>,
    pub parts: Vec<PartEntry>,
}

impl RecordInput {
    /// Applies the write-path normalization rules.
    ///
    /// - VIN and plate are trimmed and upper-cased.
    /// - Blank plate and blank notes become `None`.
    /// - Client name, notes and part text fields are trimmed.
    pub fn normalized(&self) -> Self {
        Self {
            vin_number: normalize_vin(&self.vin_number),
            license_plate: self.license_plate.as_deref().and_then(normalize_plate),
            client_name: self.client_name.trim().to_string(),
            notes: self.notes.as_deref().and_then(normalize_optional_text),
            parts: self.parts.iter().map(PartEntry::normalized).collect(),
        }
    }

    /// Validates field lengths, the client name and every part.
    ///
    /// Expects normalized input. Does not require a non-empty part list;
    /// that rule belongs to the create path only.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let vin_len = self.vin_number.chars().count();
        if vin_len > VIN_MAX_CHARS {
            return Err(ValidationError::VinTooLong { len: vin_len });
        }
        if let Some(plate) = self.license_plate.as_deref() {
            let plate_len = plate.chars().count();
            if plate_len > PLATE_MAX_CHARS {
                return Err(ValidationError::PlateTooLong { len: plate_len });
            }
        }
        if self.client_name.trim().is_empty() {
            return Err(ValidationError::MissingClientName);
        }
        for (idx, part) in self.parts.iter().enumerate() {
            part.validate(idx + 1)?;
        }
        Ok(())
    }
}

/// Parallel-sequence storage shape of a parts list.
///
/// Index `i` across all three sequences describes one `PartEntry`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartColumns {
    pub names: Vec<String>,
    pub serials: Vec<String>,
    pub prices: Vec<Option<Decimal>>,
}

impl PartColumns {
    /// Splits entries into three equal-length sequences.
    pub fn from_entries(entries: &[PartEntry]) -> Self {
        let mut columns = Self {
            names: Vec::with_capacity(entries.len()),
            serials: Vec::with_capacity(entries.len()),
            prices: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            columns.names.push(entry.name.clone());
            columns.serials.push(entry.serial_number.clone());
            columns.prices.push(entry.price);
        }
        columns
    }

    /// Whether all three sequences have the same length.
    pub fn is_aligned(&self) -> bool {
        self.names.len() == self.serials.len() && self.names.len() == self.prices.len()
    }

    /// Joins the sequences back into entries.
    ///
    /// Malformed input is truncated to the shorter of names/serials; a
    /// missing price maps to `None` instead of shifting later prices.
    pub fn into_entries(self) -> Vec<PartEntry> {
        let mut prices = self.prices.into_iter();
        self.names
            .into_iter()
            .zip(self.serials)
            .map(|(name, serial_number)| PartEntry {
                name,
                serial_number,
                price: prices.next().flatten(),
            })
            .collect()
    }
}

/// Trims and upper-cases a VIN value.
pub fn normalize_vin(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Trims and upper-cases a plate value; blank input yields `None`.
pub fn normalize_plate(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

fn normalize_optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First violated field rule for a record or parts submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// VIN is blank.
    MissingVin,
    /// VIN exceeds `VIN_MAX_CHARS`.
    VinTooLong { len: usize },
    /// Plate exceeds `PLATE_MAX_CHARS`.
    PlateTooLong { len: usize },
    /// Client name is blank.
    MissingClientName,
    /// No part remains after blank rows are dropped.
    NoParts,
    MissingPartName { position: usize },
    MissingSerialNumber { position: usize },
    MissingPrice { position: usize },
    /// Price text is not a number.
    InvalidPrice { position: usize, value: String },
    NegativePrice { position: usize },
    /// Search text is blank.
    EmptySearchQuery,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVin => write!(f, "VIN number is required"),
            Self::VinTooLong { len } => write!(
                f,
                "VIN number must be at most {VIN_MAX_CHARS} characters, got {len}"
            ),
            Self::PlateTooLong { len } => write!(
                f,
                "license plate must be at most {PLATE_MAX_CHARS} characters, got {len}"
            ),
            Self::MissingClientName => write!(f, "client name is required"),
            Self::NoParts => write!(f, "at least one part is required"),
            Self::MissingPartName { position } => {
                write!(f, "part {position}: name is required")
            }
            Self::MissingSerialNumber { position } => {
                write!(f, "part {position}: serial number is required")
            }
            Self::MissingPrice { position } => write!(f, "part {position}: price is required"),
            Self::InvalidPrice { position, value } => {
                write!(f, "part {position}: price `{value}` is not a valid number")
            }
            Self::NegativePrice { position } => {
                write!(f, "part {position}: price must not be negative")
            }
            Self::EmptySearchQuery => write!(f, "search text is required"),
        }
    }
}

impl Error for ValidationError {}
