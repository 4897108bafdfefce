//! SQLite connection pool.
//!
//! A thread-safe r2d2 pool with WAL mode enabled on every connection.
//! WAL mode allows concurrent readers while writes are serialized.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::DatabaseConfig;
use crate::core::error::{StoreError, StoreResult};
use crate::db::migrations;

pub type PooledSqlite = PooledConnection<SqliteConnectionManager>;

/// Pool statistics for monitoring.
#[derive(Debug, Clone)]
pub struct PoolState {
    /// Total connections (active + idle).
    pub connections: u32,
    /// Currently idle connections.
    pub idle_connections: u32,
}

/// Resolve a connection string into a database file path.
///
/// Accepts `file:<path>`, `sqlite:<path>`, `sqlite://<path>` or a bare path.
pub fn database_path(url: &str) -> StoreResult<PathBuf> {
    let url = url.trim();
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url);

    // Query parameters such as `?mode=rwc` carry no meaning for the pool.
    let path = path.split('?').next().unwrap_or(path);

    if path.is_empty() {
        return Err(StoreError::Connection(format!("Empty database path in '{}'", url)));
    }

    // Every pooled connection would open its own private in-memory database.
    if path == ":memory:" {
        return Err(StoreError::Connection(
            "In-memory databases cannot be shared across pooled connections".to_string(),
        ));
    }

    Ok(PathBuf::from(path))
}

/// Pooled handle to the users database.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl Database {
    /// Open the database described by `config`.
    ///
    /// This will:
    /// - Create the database file (and parent directory) if it doesn't exist
    /// - Enable WAL mode and a busy timeout on every connection
    /// - Run any pending migrations
    pub fn open(config: &DatabaseConfig) -> StoreResult<Self> {
        let path = database_path(&config.url)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA busy_timeout = 5000;
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
            ",
            )?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout))
            .build(manager)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(
            path = %path.display(),
            max_size = config.max_connections,
            "Database pool created"
        );

        {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            migrations::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, path })
    }

    /// Get a connection from the pool.
    ///
    /// Blocks until a connection is available or the timeout is reached.
    pub fn get(&self) -> StoreResult<PooledSqlite> {
        self.pool
            .get()
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    pub fn state(&self) -> PoolState {
        let state = self.pool.state();
        PoolState {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire a connection and run a trivial query.
    pub fn health_check(&self) -> StoreResult<()> {
        let conn = self.get()?;
        conn.execute_batch("SELECT 1")?;
        debug!("Database health check passed");
        Ok(())
    }
}
