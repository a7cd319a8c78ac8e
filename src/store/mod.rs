//! Persistence of completed runs in SQLite.
mod record;
mod schema;


use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, StoreError};
use crate::run::RunSummary;

use record::{RunRow, SELECT_COLUMNS};

/// Append-only collection of run summaries.
#[async_trait]
pub trait RunStore: Send {
    /// Opens the store, creating or upgrading the schema when needed.
    /// Idempotent; after a failure a later call tries again.
    async fn initialize(&mut self) -> AppResult<()>;

    /// Stores a summary and returns its store-assigned key.
    async fn insert(&mut self, summary: &RunSummary) -> AppResult<i64>;

    /// Every stored run in ascending key order.
    async fn list_all(&mut self) -> AppResult<Vec<RunSummary>>;

    /// Stored runs against one target URL, in ascending key order.
    async fn list_by_url(&mut self, target_url: &str) -> AppResult<Vec<RunSummary>>;
}

/// [`RunStore`] backed by a SQLite file, opened lazily on first use.
pub struct SqliteRunStore {
    path: PathBuf,
    conn: Option<Connection>,
}

impl SqliteRunStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connection(&mut self) -> AppResult<&Connection> {
        if self.conn.is_none() {
            let conn = open_store(&self.path).await?;
            self.conn = Some(conn);
        }
        self.conn
            .as_ref()
            .ok_or_else(|| AppError::store(StoreError::NotOpen))
    }

    async fn select(
        &mut self,
        target_url: Option<String>,
    ) -> AppResult<Vec<RunSummary>> {
        let conn = self.connection().await?;
        let rows = conn
            .call(move |conn| {
                let mut rows = Vec::new();
                match target_url {
                    Some(url) => {
                        let mut stmt = conn.prepare(&format!(
                            "SELECT {} FROM runs WHERE target_url = ?1 ORDER BY id ASC",
                            SELECT_COLUMNS
                        ))?;
                        for row in stmt.query_map([url], RunRow::from_row)? {
                            rows.push(row?);
                        }
                    }
                    None => {
                        let mut stmt = conn.prepare(&format!(
                            "SELECT {} FROM runs ORDER BY id ASC",
                            SELECT_COLUMNS
                        ))?;
                        for row in stmt.query_map([], RunRow::from_row)? {
                            rows.push(row?);
                        }
                    }
                }
                Ok(rows)
            })
            .await
            .map_err(|err| {
                AppError::store(StoreError::Query {
                    context: "list stored runs",
                    source: err,
                })
            })?;

        rows.into_iter()
            .map(|row| row.decode().map_err(AppError::store))
            .collect()
    }
}

async fn open_store(path: &Path) -> AppResult<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            AppError::store(StoreError::CreateDir {
                path: parent.to_path_buf(),
                source: err,
            })
        })?;
    }
    let conn = Connection::open(path).await.map_err(|err| {
        AppError::store(StoreError::Open {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    schema::ensure_schema(&conn).await?;
    debug!("Opened run store at {}.", path.display());
    Ok(conn)
}

#[async_trait]
impl RunStore for SqliteRunStore {
    async fn initialize(&mut self) -> AppResult<()> {
        self.connection().await?;
        Ok(())
    }

    async fn insert(&mut self, summary: &RunSummary) -> AppResult<i64> {
        let row = RunRow::encode(summary)?;
        let conn = self.connection().await?;
        let key = conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO runs (target_url, batch_size, interval_ms, max_requests,
                        start_time, end_time, success_count, failure_count, samples, errors)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    rusqlite::params![
                        row.target_url,
                        row.batch_size,
                        row.interval_ms,
                        row.max_requests,
                        row.start_time,
                        row.end_time,
                        row.success_count,
                        row.failure_count,
                        row.samples,
                        row.errors
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|err| {
                AppError::store(StoreError::Query {
                    context: "insert run record",
                    source: err,
                })
            })?;
        info!("Stored run {} in {}.", key, self.path.display());
        Ok(key)
    }

    async fn list_all(&mut self) -> AppResult<Vec<RunSummary>> {
        self.select(None).await
    }

    async fn list_by_url(&mut self, target_url: &str) -> AppResult<Vec<RunSummary>> {
        self.select(Some(target_url.to_owned())).await
    }
}
