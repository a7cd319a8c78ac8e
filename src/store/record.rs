use chrono::{DateTime, SecondsFormat, Utc};

use crate::args::PositiveU64;
use crate::error::StoreError;
use crate::run::{RequestFailure, RunConfig, RunSummary};

/// Column values of one `runs` row, as stored.
#[derive(Debug, Clone)]
pub(super) struct RunRow {
    pub(super) id: i64,
    pub(super) target_url: String,
    pub(super) batch_size: i64,
    pub(super) interval_ms: i64,
    pub(super) max_requests: i64,
    pub(super) start_time: String,
    pub(super) end_time: String,
    pub(super) success_count: i64,
    pub(super) failure_count: i64,
    pub(super) samples: String,
    pub(super) errors: String,
}

pub(super) const SELECT_COLUMNS: &str = "id, target_url, batch_size, interval_ms, max_requests, \
     start_time, end_time, success_count, failure_count, samples, errors";

impl RunRow {
    pub(super) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            target_url: row.get(1)?,
            batch_size: row.get(2)?,
            interval_ms: row.get(3)?,
            max_requests: row.get(4)?,
            start_time: row.get(5)?,
            end_time: row.get(6)?,
            success_count: row.get(7)?,
            failure_count: row.get(8)?,
            samples: row.get(9)?,
            errors: row.get(10)?,
        })
    }

    /// Encodes a summary for insertion. The `id` is left for SQLite to assign.
    pub(super) fn encode(summary: &RunSummary) -> Result<Self, StoreError> {
        let samples = serde_json::to_string(&summary.samples).map_err(|err| {
            StoreError::Encode {
                field: "samples",
                source: err,
            }
        })?;
        let errors = serde_json::to_string(&summary.errors).map_err(|err| StoreError::Encode {
            field: "errors",
            source: err,
        })?;
        Ok(Self {
            id: 0,
            target_url: summary.config.target_url.to_string(),
            batch_size: storable("batch_size", summary.config.batch_size.get())?,
            interval_ms: storable("interval_ms", summary.config.interval_ms.get())?,
            max_requests: storable("max_requests", summary.config.max_requests.get())?,
            start_time: format_timestamp(summary.start_time),
            end_time: format_timestamp(summary.end_time),
            success_count: storable("success_count", summary.success_count)?,
            failure_count: storable("failure_count", summary.failure_count)?,
            samples,
            errors,
        })
    }

    pub(super) fn decode(self) -> Result<RunSummary, StoreError> {
        let key = self.id;
        let corrupt = |field: &'static str, reason: String| StoreError::Corrupt {
            key,
            field,
            reason,
        };

        let target_url = url::Url::parse(&self.target_url)
            .map_err(|err| corrupt("target_url", err.to_string()))?;
        let config = RunConfig {
            target_url,
            interval_ms: positive(self.interval_ms).map_err(|reason| corrupt("interval_ms", reason))?,
            batch_size: positive(self.batch_size).map_err(|reason| corrupt("batch_size", reason))?,
            max_requests: positive(self.max_requests)
                .map_err(|reason| corrupt("max_requests", reason))?,
        };
        let samples: Vec<f64> = serde_json::from_str(&self.samples)
            .map_err(|err| corrupt("samples", err.to_string()))?;
        let errors: Vec<RequestFailure> = serde_json::from_str(&self.errors)
            .map_err(|err| corrupt("errors", err.to_string()))?;

        Ok(RunSummary {
            key: Some(key),
            config,
            start_time: parse_timestamp(&self.start_time)
                .map_err(|reason| corrupt("start_time", reason))?,
            end_time: parse_timestamp(&self.end_time)
                .map_err(|reason| corrupt("end_time", reason))?,
            success_count: count(self.success_count)
                .map_err(|reason| corrupt("success_count", reason))?,
            failure_count: count(self.failure_count)
                .map_err(|reason| corrupt("failure_count", reason))?,
            samples,
            errors,
        })
    }
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| err.to_string())
}

fn positive(value: i64) -> Result<PositiveU64, String> {
    let value = count(value)?;
    PositiveU64::try_from(value).map_err(|err| err.to_string())
}

fn count(value: i64) -> Result<u64, String> {
    u64::try_from(value).map_err(|_negative| format!("negative value {}", value))
}

fn storable(field: &'static str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_too_large| StoreError::OutOfRange { field, value })
}
