//! Database connection manager backed by a pooled SQLite handle.

use std::path::{Path, PathBuf};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::info;
use visapath_domain::{Result, VisaPathError};

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Pooled connection type handed to the repositories.
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database manager that wraps an r2d2 SQLite pool.
pub struct DbManager {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();

        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")
        });
        let max_connections = pool_size.max(1);
        let pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .map_err(|err| VisaPathError::Database(err.to_string()))?;

        info!(
            db_path = %path.display(),
            max_connections,
            "sqlite pool initialised"
        );

        Ok(Self { pool, path })
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<DbConnection> {
        self.pool.get().map_err(|err| VisaPathError::Database(err.to_string()))
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
            params![SCHEMA_VERSION],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Perform a health check to verify database connectivity.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(map_sql_error)?;
        Ok(())
    }
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> VisaPathError {
    VisaPathError::Database(err.to_string())
}

pub(crate) fn map_join_error(err: tokio::task::JoinError) -> VisaPathError {
    if err.is_cancelled() {
        VisaPathError::Internal("blocking task cancelled".into())
    } else {
        VisaPathError::Internal(format!("blocking task failed: {err}"))
    }
}
