//! SQLite connection management and schema migrations.
//!
//! Every service operation opens its own connection through [`open_database`], which applies
//! the connection pragmas and brings the schema up to date. Migrations are embedded in the
//! binary and tracked in the `schema_version` table.

use crate::config::CoreConfig;
use crate::{ClinicError, ClinicResult};
use rusqlite::{Connection, TransactionBehavior};
use std::fs;

/// Embedded migrations, applied in order.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../migrations/001_initial.sql"))];

/// Open a connection to the configured database and run pending migrations.
///
/// The parent directory of the database file is created if it does not exist.
///
/// # Errors
///
/// Returns `ClinicError` if the directory cannot be created, the database cannot be opened,
/// or a migration fails.
pub fn open_database(cfg: &CoreConfig) -> ClinicResult<Connection> {
    let path = cfg.database_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(ClinicError::DatabaseDirCreation)?;
    }

    let mut conn = Connection::open(path)?;
    conn.busy_timeout(cfg.busy_timeout())?;
    configure_pragmas(&conn)?;
    run_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> ClinicResult<()> {
    // journal_mode returns a row, so it cannot go through execute_batch.
    let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(())
}

/// Run all pending migrations.
///
/// Each migration runs in its own immediate transaction so two processes opening a fresh
/// database at once cannot both apply it.
pub fn run_migrations(conn: &mut Connection) -> ClinicResult<()> {
    if current_version(conn) >= latest_version() {
        return Ok(());
    }
    for (version, sql) in MIGRATIONS {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if current_version(&tx) >= *version {
            continue;
        }
        tracing::info!("Running migration v{version}");
        tx.execute_batch(sql)
            .map_err(|e| ClinicError::MigrationFailed {
                version: *version,
                reason: e.to_string(),
            })?;
        tx.commit()?;
    }
    Ok(())
}

/// The newest schema version this build knows about.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|(v, _)| *v).unwrap_or(0)
}

/// Current schema version (0 if no schema exists yet).
pub fn current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cfg(dir: &TempDir) -> CoreConfig {
        CoreConfig::with_database(dir.path().join("nested").join("clinic.sqlite3"))
            .expect("CoreConfig should build")
    }

    #[test]
    fn open_creates_parent_directory_and_schema() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        let conn = open_database(&cfg).expect("open should succeed");
        assert!(cfg.database_path().is_file());
        assert_eq!(current_version(&conn), latest_version());

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('patients','diagnoses','prescriptions','prescription_items','profiles','user_roles')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 6);
    }

    #[test]
    fn migrations_are_idempotent() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        drop(open_database(&cfg).unwrap());
        let mut conn = open_database(&cfg).expect("reopen should succeed");
        run_migrations(&mut conn).expect("re-running migrations should be a no-op");

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn foreign_keys_enabled() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let conn = open_database(&test_cfg(&dir)).unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn schema_rejects_unknown_prescription_status() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let conn = open_database(&test_cfg(&dir)).unwrap();
        conn.execute_batch("PRAGMA foreign_keys=OFF;").unwrap();

        let err = conn.execute(
            "INSERT INTO prescriptions (id, prescription_number, diagnosis_id, patient_id,
             doctor_id, doctor_name, status, created_at, updated_at)
             VALUES ('a', 'R-20261016-0001', 'd', 'p', 'doc', 'Dr', 'dispensed', 'now', 'now')",
            [],
        );
        assert!(err.is_err(), "CHECK constraint should reject the status");
    }
}
