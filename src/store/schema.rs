use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

pub(super) const SCHEMA_VERSION: i64 = 1;

const CREATE_RUNS_V1: &str = "CREATE TABLE IF NOT EXISTS runs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        target_url TEXT NOT NULL,
        batch_size INTEGER NOT NULL,
        interval_ms INTEGER NOT NULL,
        max_requests INTEGER NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        success_count INTEGER NOT NULL,
        failure_count INTEGER NOT NULL,
        samples TEXT NOT NULL,
        errors TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_runs_target_url ON runs(target_url);";

struct SchemaState {
    version: i64,
    has_runs_table: bool,
}

async fn read_schema_state(conn: &Connection) -> Result<SchemaState, StoreError> {
    conn.call(|conn| {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        let table: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'runs'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(SchemaState {
            version,
            has_runs_table: table.is_some(),
        })
    })
    .await
    .map_err(|err| StoreError::Query {
        context: "read schema version",
        source: err,
    })
}

/// Brings the schema up to [`SCHEMA_VERSION`]. Safe to call on every open.
pub(super) async fn ensure_schema(conn: &Connection) -> Result<(), StoreError> {
    let state = read_schema_state(conn).await?;
    if state.version > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: state.version,
            supported: SCHEMA_VERSION,
        });
    }
    if state.version == SCHEMA_VERSION && state.has_runs_table {
        return Ok(());
    }

    info!(
        "Upgrading run store schema from version {} to {}.",
        state.version, SCHEMA_VERSION
    );
    conn.call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(CREATE_RUNS_V1)?;
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()?;
        Ok(())
    })
    .await
    .map_err(|err| StoreError::Upgrade {
        version: SCHEMA_VERSION,
        source: err,
    })
}
