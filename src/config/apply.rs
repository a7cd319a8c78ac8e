use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveU64, TesterArgs};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Options given on the
/// command line (or through their env var) always win.
///
/// # Errors
///
/// Returns an error when config values are invalid.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "interval_ms")
        && let Some(interval) = config.interval_ms
    {
        args.interval_ms = ensure_positive_u64(interval, "interval_ms")?;
    }

    if !is_cli(matches, "batch_size")
        && let Some(batch_size) = config.batch_size
    {
        args.batch_size = ensure_positive_u64(batch_size, "batch_size")?;
    }

    if !is_cli(matches, "max_requests")
        && let Some(max_requests) = config.max_requests
    {
        args.max_requests = ensure_positive_u64(max_requests, "max_requests")?;
    }

    if !is_cli(matches, "token")
        && let Some(token) = config.token.clone()
    {
        args.token = Some(token);
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        let timeout = timeout.to_duration().map_err(|err| {
            AppError::config(ConfigError::InvalidDuration {
                field: "timeout",
                source: err,
            })
        })?;
        args.request_timeout = Some(timeout);
    }

    if !is_cli(matches, "db_path")
        && let Some(db_path) = config.db_path.clone()
    {
        args.db_path = db_path;
    }

    if !is_cli(matches, "no_store")
        && let Some(no_store) = config.no_store
    {
        args.no_store = no_store;
    }

    if !is_cli(matches, "summary_format")
        && let Some(format) = config.summary_format
    {
        args.summary_format = format;
    }

    if !is_cli(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    if !is_cli(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn ensure_positive_u64(value: u64, field: &'static str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value)
        .map_err(|err| AppError::config(ConfigError::FieldMustBePositive { field, source: err }))
}
