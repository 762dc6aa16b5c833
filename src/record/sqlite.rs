//! SQLite-backed record store.
//!
//! Uses an r2d2 connection pool; every query runs on the blocking thread pool
//! so request handlers never block the async runtime.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{ImageRecord, NewImageRecord, RecordStore};
use crate::error::RecordError;

/// Type alias for the connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS images (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT    NOT NULL,
    file_path   TEXT    NOT NULL,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_images_created_at ON images (created_at DESC, id DESC);
";

const SELECT_COLUMNS: &str = "SELECT id, title, file_path, created_at, updated_at FROM images";

/// Record store persisted to a SQLite database.
///
/// Timestamps are stored as microseconds since the Unix epoch.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: DbPool,
}

impl SqliteRecordStore {
    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let manager = SqliteConnectionManager::file(path.as_ref())
            .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));

        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| RecordError::Database(format!("failed to create pool: {}", e)))?;

        Self::from_pool(pool)
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds a single connection since each SQLite in-memory
    /// connection is its own database.
    pub fn open_in_memory() -> Result<Self, RecordError> {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .map_err(|e| RecordError::Database(format!("failed to create pool: {}", e)))?;

        Self::from_pool(pool)
    }

    fn from_pool(pool: DbPool) -> Result<Self, RecordError> {
        let conn = pool
            .get()
            .map_err(|e| RecordError::Database(format!("failed to get connection: {}", e)))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| RecordError::Database(format!("failed to apply schema: {}", e)))?;
        drop(conn);

        debug!("SQLite record store ready");
        Ok(Self { pool })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, RecordError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, RecordError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(db_err)?;
            f(&conn)
        })
        .await
        .map_err(|e| RecordError::Database(format!("blocking task failed: {}", e)))?
    }
}

fn db_err(e: impl std::fmt::Display) -> RecordError {
    RecordError::Database(e.to_string())
}

fn from_micros(idx: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, micros))
}

/// Expects columns in order: id, title, file_path, created_at, updated_at.
fn parse_row(row: &rusqlite::Row) -> rusqlite::Result<ImageRecord> {
    Ok(ImageRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        file_path: row.get(2)?,
        created_at: from_micros(3, row.get(3)?)?,
        updated_at: from_micros(4, row.get(4)?)?,
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: NewImageRecord) -> Result<ImageRecord, RecordError> {
        self.with_conn(move |conn| {
            let micros = Utc::now().timestamp_micros();
            conn.execute(
                "INSERT INTO images (title, file_path, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![record.title, record.file_path, micros],
            )
            .map_err(db_err)?;

            let now = from_micros(3, micros).map_err(db_err)?;
            Ok(ImageRecord {
                id: conn.last_insert_rowid(),
                title: record.title,
                file_path: record.file_path,
                created_at: now,
                updated_at: now,
            })
        })
        .await
    }

    async fn find(&self, id: i64) -> Result<Option<ImageRecord>, RecordError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                parse_row,
            )
            .optional()
            .map_err(db_err)
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), RecordError> {
        self.with_conn(move |conn| {
            let affected = conn
                .execute("DELETE FROM images WHERE id = ?1", params![id])
                .map_err(db_err)?;
            if affected == 0 {
                Err(RecordError::NotFound(id))
            } else {
                Ok(())
            }
        })
        .await
    }

    async fn latest(&self, title_filter: Option<&str>) -> Result<Vec<ImageRecord>, RecordError> {
        let filter = title_filter.map(str::to_owned);
        self.with_conn(move |conn| {
            // instr() is case-sensitive, unlike LIKE
            let sql = match filter {
                Some(_) => format!(
                    "{} WHERE instr(title, ?1) > 0 ORDER BY created_at DESC, id DESC",
                    SELECT_COLUMNS
                ),
                None => format!("{} ORDER BY created_at DESC, id DESC", SELECT_COLUMNS),
            };

            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let rows = match &filter {
                Some(needle) => stmt.query_map(params![needle], parse_row),
                None => stmt.query_map([], parse_row),
            }
            .map_err(db_err)?;

            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
        })
        .await
    }

    async fn count(&self) -> Result<usize, RecordError> {
        self.with_conn(|conn| {
            let n: i64 = conn
                .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))
                .map_err(db_err)?;
            Ok(n as usize)
        })
        .await
    }
}
