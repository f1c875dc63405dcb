//! Command-line access to the parts ledger.
//!
//! # Responsibility
//! - Provide record entry, lookups, part edits, deletion and report export
//!   over the configured database.
//! - Keep `ping` usable without configuration or login.
//!
//! # Invariants
//! - Every command except `ping` requires a successful login.
//! - Record changes go through `RecordService`, so form validation always
//!   runs before the store is touched.

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::info;
use partledger_core::{
    init_logging, open_db, AppConfig, Credentials, Lookup, PartField, PartsEditor,
    PlainTextWriter, Record, RecordForm, RecordService, RecordStore, SessionContext,
    SessionPersistence, SqliteRecordStore, SubmitError,
};
use std::io::{self, Write};
use std::path::PathBuf;

const PART_VALUES: usize = 3;

#[derive(Parser)]
#[command(name = "partledger")]
#[command(about = "Vehicle client and purchased parts ledger")]
struct Cli {
    #[arg(long, global = true)]
    username: Option<String>,
    #[arg(long, global = true)]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prints core linkage and version.
    Ping,
    /// Creates a record with at least one part.
    Add {
        #[arg(long)]
        vin: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        plate: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Repeatable: `--part NAME SERIAL PRICE`.
        #[arg(
            long = "part",
            num_args = PART_VALUES,
            value_names = ["NAME", "SERIAL", "PRICE"],
            action = ArgAction::Append
        )]
        parts: Vec<String>,
    },
    /// Edits the record with `vin`; given parts replace the stored list.
    Update {
        vin: String,
        #[arg(long)]
        new_vin: Option<String>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        plate: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(
            long = "part",
            num_args = PART_VALUES,
            value_names = ["NAME", "SERIAL", "PRICE"],
            action = ArgAction::Append
        )]
        parts: Vec<String>,
    },
    /// Appends one part to the record with `vin`.
    AddPart {
        vin: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        serial: String,
        #[arg(long)]
        price: String,
    },
    /// Removes the part at 1-based `position` from the record with `vin`.
    RemovePart { vin: String, position: usize },
    /// Deletes the record with `vin`.
    Delete { vin: String },
    /// Looks up one record by exact VIN.
    FindVin { vin: String },
    /// Lists records whose plate matches (`%`/`_` wildcards allowed).
    FindPlate { plate: String },
    /// Writes the report of the record with `vin` into `out`.
    Export {
        vin: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    // A missing .env is fine; the process environment still applies.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    if let Command::Ping = cli.command {
        return write_ping(&mut stdout);
    }

    let config = AppConfig::from_env();
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).context("failed to start logging")?;
    }
    let _session = authenticate(
        &config.credentials,
        cli.username.as_deref(),
        cli.password.as_deref(),
    )?;

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;
    let store = SqliteRecordStore::try_new(&conn).context("database is not ready")?;
    let service = RecordService::new(store, config.report.clone());

    execute(cli.command, &service, &mut stdout)
}

/// Opens the session every data command needs.
fn authenticate(
    credentials: &Credentials,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<SessionContext> {
    let session = SessionContext::login(
        credentials,
        username.unwrap_or_default(),
        password.unwrap_or_default(),
        SessionPersistence::Session,
    )
    .context("login required")?;
    info!("event=cli_login module=cli status=ok");
    Ok(session)
}

/// Runs one command against `service`, writing user output to `out`.
fn execute<S: RecordStore, W: Write>(
    command: Command,
    service: &RecordService<S>,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Ping => write_ping(out),
        Command::Add {
            vin,
            client,
            plate,
            notes,
            parts,
        } => {
            let mut form = RecordForm::new_create();
            form.vin_number = vin;
            form.client_name = client;
            form.license_plate = plate.unwrap_or_default();
            form.notes = notes.unwrap_or_default();
            fill_parts(&mut form.parts, &parts)?;
            let record = service.submit_create(&form).map_err(submit_error)?;
            write_json(out, &record)
        }
        Command::Update {
            vin,
            new_vin,
            client,
            plate,
            notes,
            parts,
        } => {
            let record = record_by_vin(service, &vin)?;
            let mut form = RecordForm::from_record(&record);
            if let Some(new_vin) = new_vin {
                form.vin_number = new_vin;
            }
            if let Some(client) = client {
                form.client_name = client;
            }
            if let Some(plate) = plate {
                form.license_plate = plate;
            }
            if let Some(notes) = notes {
                form.notes = notes;
            }
            if !parts.is_empty() {
                form.parts = PartsEditor::from_parts(&[]);
                fill_parts(&mut form.parts, &parts)?;
            }
            let updated = service
                .submit_update(record.id, &form)
                .map_err(submit_error)?;
            write_json(out, &updated)
        }
        Command::AddPart {
            vin,
            name,
            serial,
            price,
        } => {
            let record = record_by_vin(service, &vin)?;
            let updated = service
                .add_part(record.id, &name, &serial, &price)
                .map_err(submit_error)?;
            write_json(out, &updated)
        }
        Command::RemovePart { vin, position } => {
            if position == 0 {
                bail!("part positions start at 1");
            }
            let record = record_by_vin(service, &vin)?;
            let updated = service
                .remove_part(record.id, position - 1)
                .map_err(submit_error)?;
            write_json(out, &updated)
        }
        Command::Delete { vin } => {
            let record = record_by_vin(service, &vin)?;
            if service.delete(record.id).map_err(submit_error)? {
                writeln!(out, "deleted record for VIN {}", record.vin_number)?;
            } else {
                writeln!(out, "no record for VIN {}", record.vin_number)?;
            }
            Ok(())
        }
        Command::FindVin { vin } => match service.search_by_vin(&vin).map_err(submit_error)? {
            Lookup::Found(record) => write_json(out, &record),
            Lookup::NotFound => {
                writeln!(out, "no record for VIN {}", vin.trim().to_uppercase())?;
                Ok(())
            }
        },
        Command::FindPlate { plate } => match service.search_by_plate(&plate).map_err(submit_error)? {
            Lookup::Found(records) => write_json(out, &records),
            Lookup::NotFound => {
                writeln!(out, "no records for plate {}", plate.trim().to_uppercase())?;
                Ok(())
            }
        },
        Command::Export { vin, out: dir } => {
            let record = record_by_vin(service, &vin)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create `{}`", dir.display()))?;
            let mut writer = PlainTextWriter::default();
            let generated_at = chrono::Local::now().naive_local();
            let path = service
                .export_report(&record, &mut writer, &dir, generated_at)
                .context("failed to write report")?;
            writeln!(out, "{}", path.display())?;
            Ok(())
        }
    }
}

fn record_by_vin<S: RecordStore>(service: &RecordService<S>, vin: &str) -> Result<Record> {
    service
        .search_by_vin(vin)
        .map_err(submit_error)?
        .found()
        .ok_or_else(|| anyhow!("no record for VIN {}", vin.trim().to_uppercase()))
}

/// Writes `NAME SERIAL PRICE` triples into consecutive editor rows.
fn fill_parts(editor: &mut PartsEditor, values: &[String]) -> Result<()> {
    for (index, part) in values.chunks_exact(PART_VALUES).enumerate() {
        if index >= editor.len() {
            editor.add_row();
        }
        editor.update_field(index, PartField::Name, part[0].as_str())?;
        editor.update_field(index, PartField::SerialNumber, part[1].as_str())?;
        editor.update_field(index, PartField::Price, part[2].as_str())?;
    }
    Ok(())
}

fn write_ping<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "partledger_core ping={}", partledger_core::ping())?;
    writeln!(out, "partledger_core version={}", partledger_core::core_version())?;
    Ok(())
}

fn write_json<T: serde::Serialize, W: Write>(out: &mut W, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn submit_error(err: SubmitError) -> anyhow::Error {
    anyhow!("{err}")
}
