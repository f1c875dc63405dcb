//! Persistence client contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose insert/select/update/delete over the single `vin_records` table.
//! - Encode parts as three JSON array columns and decode them back.
//! - Surface unique-constraint violations as a distinguishable error.
//!
//! # Invariants
//! - Parts are always written through `PartColumns::from_entries`, so the
//!   three stored arrays have equal length; the schema `CHECK` rejects
//!   anything else.
//! - Reads never index past the shortest array (see `PartColumns::into_entries`).
//! - Ids are generated here, never by callers.

use crate::db::{ensure_table_columns, DbError};
use crate::model::record::{PartColumns, Record, RecordId};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

const RECORD_TABLE: &str = "vin_records";
const RECORD_COLUMNS: &[&str] = &[
    "id",
    "vin_number",
    "license_plate",
    "client_name",
    "notes",
    "parts_bought",
    "part_serial_numbers",
    "part_prices",
    "created_at",
    "updated_at",
];

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    vin_number,
    license_plate,
    client_name,
    notes,
    parts_bought,
    part_serial_numbers,
    part_prices,
    created_at,
    updated_at
FROM vin_records";

const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-side failure.
#[derive(Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the store message.
    UniqueViolation { message: String },
    Db(DbError),
    /// Persisted row cannot be decoded into a record.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UniqueViolation { message } => write!(f, "unique constraint violated: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UniqueViolation { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(err, message)
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Self::UniqueViolation {
                    message: message.clone().unwrap_or_else(|| err.to_string()),
                }
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Column values for insert and whole-row update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub vin_number: String,
    pub license_plate: Option<String>,
    pub client_name: String,
    pub notes: Option<String>,
    pub parts: PartColumns,
}

/// Persistence client over one logical table of records.
pub trait RecordStore {
    /// Inserts one row and returns the store-assigned id.
    fn insert(&self, row: &RecordRow) -> StoreResult<RecordId>;
    fn select_by_id(&self, id: RecordId) -> StoreResult<Option<Record>>;
    /// Exact (case-insensitive) VIN match.
    fn select_by_vin(&self, vin: &str) -> StoreResult<Option<Record>>;
    /// Case-insensitive `LIKE` match on the plate, newest first.
    fn select_by_plate_pattern(&self, pattern: &str) -> StoreResult<Vec<Record>>;
    /// Replaces every mutable column; `false` when `id` is unknown.
    fn update_row(&self, id: RecordId, row: &RecordRow) -> StoreResult<bool>;
    /// Replaces the three parts columns only; `false` when `id` is unknown.
    fn update_parts(&self, id: RecordId, parts: &PartColumns) -> StoreResult<bool>;
    /// Hard delete; `false` when `id` is unknown.
    fn delete(&self, id: RecordId) -> StoreResult<bool>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Constructs a store from a migrated connection.
    ///
    /// # Errors
    /// - `StoreError::Db` when the records table or one of its columns is
    ///   missing (connection was not opened through `db::open_db*`).
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table_columns(conn, RECORD_TABLE, RECORD_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn insert(&self, row: &RecordRow) -> StoreResult<RecordId> {
        let id = Uuid::new_v4();
        let encoded = EncodedParts::encode(&row.parts)?;
        self.conn.execute(
            "INSERT INTO vin_records (
                id,
                vin_number,
                license_plate,
                client_name,
                notes,
                parts_bought,
                part_serial_numbers,
                part_prices
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                row.vin_number.as_str(),
                row.license_plate.as_deref(),
                row.client_name.as_str(),
                row.notes.as_deref(),
                encoded.names,
                encoded.serials,
                encoded.prices,
            ],
        )?;
        Ok(id)
    }

    fn select_by_id(&self, id: RecordId) -> StoreResult<Option<Record>> {
        self.select_one(&format!("{RECORD_SELECT_SQL} WHERE id = ?1;"), &id.to_string())
    }

    fn select_by_vin(&self, vin: &str) -> StoreResult<Option<Record>> {
        self.select_one(&format!("{RECORD_SELECT_SQL} WHERE vin_number = ?1;"), vin)
    }

    fn select_by_plate_pattern(&self, pattern: &str) -> StoreResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE license_plate LIKE ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([pattern])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }

    fn update_row(&self, id: RecordId, row: &RecordRow) -> StoreResult<bool> {
        let encoded = EncodedParts::encode(&row.parts)?;
        let changed = self.conn.execute(
            &format!(
                "UPDATE vin_records
                 SET
                    vin_number = ?2,
                    license_plate = ?3,
                    client_name = ?4,
                    notes = ?5,
                    parts_bought = ?6,
                    part_serial_numbers = ?7,
                    part_prices = ?8,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                id.to_string(),
                row.vin_number.as_str(),
                row.license_plate.as_deref(),
                row.client_name.as_str(),
                row.notes.as_deref(),
                encoded.names,
                encoded.serials,
                encoded.prices,
            ],
        )?;
        Ok(changed > 0)
    }

    fn update_parts(&self, id: RecordId, parts: &PartColumns) -> StoreResult<bool> {
        let encoded = EncodedParts::encode(parts)?;
        let changed = self.conn.execute(
            &format!(
                "UPDATE vin_records
                 SET
                    parts_bought = ?2,
                    part_serial_numbers = ?3,
                    part_prices = ?4,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![id.to_string(), encoded.names, encoded.serials, encoded.prices],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, id: RecordId) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM vin_records WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

impl SqliteRecordStore<'_> {
    fn select_one(&self, sql: &str, key: &str) -> StoreResult<Option<Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        stmt.query_row([key], |row| Ok(parse_record_row(row)))
            .optional()?
            .transpose()
    }
}

/// JSON text for the three parallel columns.
struct EncodedParts {
    names: String,
    serials: String,
    prices: String,
}

impl EncodedParts {
    fn encode(columns: &PartColumns) -> StoreResult<Self> {
        if !columns.is_aligned() {
            return Err(StoreError::InvalidData(format!(
                "refusing to write misaligned parts: names={} serials={} prices={}",
                columns.names.len(),
                columns.serials.len(),
                columns.prices.len()
            )));
        }

        let prices = columns
            .prices
            .iter()
            .map(|price| price.map_or(Value::Null, decimal_to_json))
            .collect::<Vec<_>>();

        Ok(Self {
            names: to_json_text(&columns.names)?,
            serials: to_json_text(&columns.serials)?,
            prices: to_json_text(&prices)?,
        })
    }
}

fn to_json_text<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode parts column: {err}")))
}

/// Exact decimal text; a JSON number would round through `f64`.
fn decimal_to_json(value: Decimal) -> Value {
    Value::String(value.normalize().to_string())
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<Record> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{id_text}` in vin_records.id"))
    })?;

    let columns = PartColumns {
        names: parse_text_array(&row.get::<_, String>("parts_bought")?, "parts_bought")?,
        serials: parse_text_array(
            &row.get::<_, String>("part_serial_numbers")?,
            "part_serial_numbers",
        )?,
        prices: parse_price_array(&row.get::<_, String>("part_prices")?)?,
    };
    if !columns.is_aligned() {
        warn!(
            "event=parts_misaligned module=repo status=degraded record_id={} names={} serials={} prices={}",
            id,
            columns.names.len(),
            columns.serials.len(),
            columns.prices.len()
        );
    }

    Ok(Record {
        id,
        vin_number: row.get("vin_number")?,
        license_plate: row.get("license_plate")?,
        client_name: row.get("client_name")?,
        notes: row.get("notes")?,
        parts: columns.into_entries(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_json_array(text: &str, column: &str) -> StoreResult<Vec<Value>> {
    serde_json::from_str(text).map_err(|err| {
        StoreError::InvalidData(format!("vin_records.{column} is not a JSON array: {err}"))
    })
}

fn parse_text_array(text: &str, column: &str) -> StoreResult<Vec<String>> {
    parse_json_array(text, column)?
        .into_iter()
        .map(|value| match value {
            Value::String(text) => Ok(text),
            Value::Number(number) => Ok(number.to_string()),
            other => Err(StoreError::InvalidData(format!(
                "unexpected value `{other}` in vin_records.{column}"
            ))),
        })
        .collect()
}

fn parse_price_array(text: &str) -> StoreResult<Vec<Option<Decimal>>> {
    parse_json_array(text, "part_prices")?
        .into_iter()
        .map(|value| match value {
            Value::Null => Ok(None),
            Value::Number(number) => parse_decimal(&number.to_string()).map(Some),
            Value::String(text) => parse_decimal(text.trim()).map(Some),
            other => Err(StoreError::InvalidData(format!(
                "unexpected value `{other}` in vin_records.part_prices"
            ))),
        })
        .collect()
}

fn parse_decimal(text: &str) -> StoreResult<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map(|value| value.normalize())
        .map_err(|_| {
            StoreError::InvalidData(format!("invalid price `{text}` in vin_records.part_prices"))
        })
}
