use leadflow_core::db::migrations::latest_version;
use leadflow_core::db::{open_db, open_db_in_memory, DbError};
use leadflow_core::{RepoError, SqliteContactRepository, SqliteLeadRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "operators",
        "sources",
        "operator_source_weights",
        "leads",
        "contacts",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let result = conn.execute(
        "INSERT INTO contacts (lead_id, source_id, status) VALUES (999, 999, 'new');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn schema_rejects_unknown_status_and_zero_weight() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO operators (name) VALUES ('op');
         INSERT INTO sources (name) VALUES ('src');
         INSERT INTO leads (name) VALUES ('lead');",
    )
    .unwrap();

    let bad_weight = conn.execute(
        "INSERT INTO operator_source_weights (operator_id, source_id, weight) VALUES (1, 1, 0);",
        [],
    );
    assert!(bad_weight.is_err());

    let bad_status = conn.execute(
        "INSERT INTO contacts (lead_id, source_id, status) VALUES (1, 1, 'archived');",
        [],
    );
    assert!(bad_status.is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leadflow.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO sources (name) VALUES ('web');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let sources: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM sources;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(sources, 1);
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
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteLeadRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
    assert!(SqliteContactRepository::try_new(&conn).is_err());
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
