//! Schema migrations, applied in order and tracked in the `migrations` table.

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::core::error::{StoreError, StoreResult};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations.
///
/// The version check and every pending step run in one IMMEDIATE
/// transaction, so processes opening the same fresh file apply each
/// migration exactly once.
pub fn run_migrations(conn: &mut Connection) -> StoreResult<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )
    .map_err(|e| StoreError::Migration(e.to_string()))?;

    let current_version: i32 = tx
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    debug!(current_version, target_version = CURRENT_VERSION, "Checking migrations");

    if current_version < 1 {
        migrate_v1_users(&tx)?;
    }

    tx.commit().map_err(|e| StoreError::Migration(e.to_string()))?;
    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )
    .map_err(|e| StoreError::Migration(e.to_string()))?;
    info!(version, name, "Migration applied");
    Ok(())
}

/// V1: `User` table. `idCardNo` holds ciphertext envelopes and carries no
/// unique constraint.
fn migrate_v1_users(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS "User" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            idCardNo TEXT
        );
        "#,
    )
    .map_err(|e| StoreError::Migration(e.to_string()))?;

    record_migration(conn, 1, "users")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_run_successfully() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        let columns: Vec<String> = conn
            .prepare(r#"PRAGMA table_info("User")"#)
            .unwrap()
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert_eq!(columns, vec!["id", "name", "email", "idCardNo"]);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();

        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);

        let applied: i32 = conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 1);
    }
}
