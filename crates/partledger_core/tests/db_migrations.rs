use partledger_core::db::migrations::latest_version;
use partledger_core::db::{open_db, open_db_in_memory, DbError};
use partledger_core::{SqliteRecordStore, StoreError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "vin_records");
    assert!(SqliteRecordStore::try_new(&conn).is_ok());
}

#[test]
fn reopening_file_database_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partledger.sqlite3");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO vin_records (id, vin_number, client_name) VALUES ('a', 'VIN1', 'Ana');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM vin_records;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteRecordStore::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        StoreError::Db(DbError::MissingTable("vin_records"))
    ));
}

#[test]
fn schema_rejects_misaligned_part_columns() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO vin_records (
            id, vin_number, client_name, parts_bought, part_serial_numbers, part_prices
        ) VALUES ('x', 'VIN2', 'Ana', '[\"Filtru\"]', '[]', '[10]');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn schema_rejects_overlong_vin() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO vin_records (id, vin_number, client_name)
         VALUES ('y', '1HGCM82633A004352X', 'Ana');",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
