//! Core domain logic for the parts ledger.
//! This crate is the single source of truth for record invariants.

pub mod config;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod report;
pub mod repo;
pub mod service;
pub mod session;

pub use config::AppConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use editor::parts_editor::{EditorError, EditorMode, PartDraft, PartField, PartsEditor};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{
    PartColumns, PartEntry, Record, RecordId, RecordInput, ValidationError,
};
pub use report::renderer::{ReportConfig, ReportRenderer};
pub use report::writer::{DocumentWriter, PlainTextWriter};
pub use repo::record_repo::{Lookup, NotFound, RecordRepository, RepoError, RepoResult};
pub use repo::record_store::{RecordStore, SqliteRecordStore, StoreError, StoreResult};
pub use service::record_service::{RecordForm, RecordService, SubmitError, SubmitResult};
pub use session::{Credentials, SessionContext, SessionError, SessionGate, SessionPersistence};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
