use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::args::{PositiveU64, TesterArgs};
use crate::error::{AppError, AppResult, ValidationError};

/// Parameters of one run. Fixed once the run has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub target_url: Url,
    pub interval_ms: PositiveU64,
    pub batch_size: PositiveU64,
    pub max_requests: PositiveU64,
}

impl RunConfig {
    /// Builds a run config from raw values.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is not an absolute http(s) URL or any
    /// numeric value is zero.
    pub fn new(
        target_url: &str,
        interval_ms: u64,
        batch_size: u64,
        max_requests: u64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            target_url: parse_target_url(target_url)?,
            interval_ms: PositiveU64::try_from(interval_ms)?,
            batch_size: PositiveU64::try_from(batch_size)?,
            max_requests: PositiveU64::try_from(max_requests)?,
        })
    }

    /// Builds the run config from parsed CLI/config arguments.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is missing or invalid.
    pub fn from_args(args: &TesterArgs) -> AppResult<Self> {
        let url = args
            .url
            .as_deref()
            .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
        Ok(Self {
            target_url: parse_target_url(url)?,
            interval_ms: args.interval_ms,
            batch_size: args.batch_size,
            max_requests: args.max_requests,
        })
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.get())
    }
}

fn parse_target_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|err| ValidationError::InvalidUrl {
        url: raw.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::UnsupportedScheme {
            scheme: other.to_owned(),
        }),
    }
}

/// Result of one dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Success { elapsed_seconds: f64 },
    Failure(RequestFailure),
}

/// Whatever the failed request carried. Transport errors have no status and a
/// `null` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFailure {
    pub status_code: Option<u16>,
    pub error_body: serde_json::Value,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Draining,
    Completed,
}

impl RunPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Running => "running",
            RunPhase::Draining => "draining",
            RunPhase::Completed => "completed",
        }
    }
}

/// Counter snapshot published after every state change of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunProgress {
    pub phase: RunPhase,
    pub issued: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl RunProgress {
    #[must_use]
    pub const fn resolved(&self) -> u64 {
        self.succeeded.saturating_add(self.failed)
    }

    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.issued.saturating_sub(self.resolved())
    }
}

/// Immutable record of a completed run. `key` is assigned by the run store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub key: Option<i64>,
    pub config: RunConfig,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub success_count: u64,
    pub failure_count: u64,
    pub samples: Vec<f64>,
    pub errors: Vec<RequestFailure>,
}

impl RunSummary {
    #[must_use]
    pub const fn issued_count(&self) -> u64 {
        self.success_count.saturating_add(self.failure_count)
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time
            .signed_duration_since(self.start_time)
            .to_std()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn with_key(mut self, key: i64) -> Self {
        self.key = Some(key);
        self
    }
}
