use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create store directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open run store '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: tokio_rusqlite::Error,
    },
    #[error("Schema upgrade to version {version} failed: {source}")]
    Upgrade {
        version: i64,
        #[source]
        source: tokio_rusqlite::Error,
    },
    #[error("Run store schema version {found} is newer than supported version {supported}.")]
    UnsupportedVersion { found: i64, supported: i64 },
    #[error("Failed to {context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: tokio_rusqlite::Error,
    },
    #[error("Failed to encode {field} for run record: {source}")]
    Encode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cannot store {field} = {value}: exceeds the largest storable value.")]
    OutOfRange { field: &'static str, value: u64 },
    #[error("Run store connection is not open.")]
    NotOpen,
    #[error("Corrupt {field} in run record {key}: {reason}")]
    Corrupt {
        key: i64,
        field: &'static str,
        reason: String,
    },
}
