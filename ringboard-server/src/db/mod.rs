//! Database Module
//!
//! SQLite connection pool, migrations and per-table query functions.

pub mod calls;
pub mod connections;
pub mod customers;
pub mod orders;
pub mod settings;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Database service, owns the SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (or create) the database with WAL mode and apply migrations
    pub async fn new(database_url: &str) -> Result<Self, BoxError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_millis(5000))
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!("Database connection established (SQLite WAL, busy_timeout=5000ms)");

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Single-connection in-memory database with the real schema.
    ///
    /// The connection is pinned so the database lives as long as the pool.
    pub async fn in_memory() -> Result<Self, BoxError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    DbService::in_memory().await.unwrap().pool
}

/// File-backed database with the production pool settings, so concurrent
/// writers really contend. Files are removed on drop.
#[cfg(test)]
pub(crate) struct FileTestDb {
    pub pool: SqlitePool,
    path: std::path::PathBuf,
}

#[cfg(test)]
impl FileTestDb {
    pub(crate) async fn open() -> Self {
        let path = std::env::temp_dir().join(format!("ringboard-test-{}.db", uuid::Uuid::new_v4()));
        let db = DbService::new(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        Self { pool: db.pool, path }
    }
}

#[cfg(test)]
impl Drop for FileTestDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
