use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use super::defaults::{
    DEFAULT_BATCH_SIZE, DEFAULT_INTERVAL_MS, DEFAULT_MAX_REQUESTS, default_db_path,
};
use super::parsers::{parse_duration_arg, parse_positive_u64};
use super::types::{PositiveU64, SummaryFormat};

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List previously stored runs
    History(HistoryArgs),
}

#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    /// Only show runs against this target URL
    #[arg(long = "url", short = 'u')]
    pub url: Option<String>,

    /// Print the stored records as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Interval-driven HTTP burst load tester: fires batches of GET requests on a fixed interval up to a request cap and keeps a history of every run."
)]
pub struct TesterArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Target URL for the GET requests
    #[arg(long, short)]
    pub url: Option<String>,

    /// Delay between bursts in milliseconds
    #[arg(
        long = "interval",
        short = 'i',
        default_value = DEFAULT_INTERVAL_MS,
        value_parser = parse_positive_u64
    )]
    pub interval_ms: PositiveU64,

    /// Requests fired per burst
    #[arg(
        long = "batch-size",
        short = 'b',
        default_value = DEFAULT_BATCH_SIZE,
        value_parser = parse_positive_u64
    )]
    pub batch_size: PositiveU64,

    /// Total number of requests issued before dispatch stops
    #[arg(
        long = "max-requests",
        short = 'n',
        default_value = DEFAULT_MAX_REQUESTS,
        value_parser = parse_positive_u64
    )]
    pub max_requests: PositiveU64,

    /// Bearer token attached as the Authorization header
    #[arg(long = "token", env = "VOLLEY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Client-side request timeout (supports ms/s/m/h). Unset means no timeout.
    #[arg(long = "timeout", value_parser = parse_duration_arg)]
    pub request_timeout: Option<Duration>,

    /// SQLite file holding the run history
    #[arg(long = "db-path", default_value_t = default_db_path())]
    pub db_path: String,

    /// Do not persist the run summary
    #[arg(long = "no-store")]
    pub no_store: bool,

    /// Output format for the final summary
    #[arg(long = "summary-format", value_enum, default_value_t = SummaryFormat::Text)]
    pub summary_format: SummaryFormat,

    /// Path to a TOML or JSON config file
    #[arg(long = "config", short = 'c')]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
