use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::{
    args::SummaryFormat,
    error::AppResult,
    metrics::LatencyReport,
    run::RunSummary,
};

const PERCENT_DIVISOR: u64 = 100;
/// Error groups shown in the text summary.
const MAX_ERROR_LINES: usize = 10;

#[derive(Serialize)]
struct SummaryOutput<'a> {
    #[serde(flatten)]
    run: &'a RunSummary,
    latency: LatencyReport,
}

pub(crate) fn print_summary(run: &RunSummary, format: SummaryFormat) -> AppResult<()> {
    let latency = latency_report(run);
    match format {
        SummaryFormat::Json => {
            let output = SummaryOutput { run, latency };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        SummaryFormat::Text => {
            for line in summary_lines(run, &latency) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn latency_report(run: &RunSummary) -> LatencyReport {
    LatencyReport::from_samples(&run.samples).unwrap_or_else(|err| {
        warn!("Failed to build latency report: {}", err);
        LatencyReport::default()
    })
}

pub(crate) fn success_rate_x100(run: &RunSummary) -> u64 {
    let scaled = u128::from(run.success_count)
        .saturating_mul(10_000)
        .checked_div(u128::from(run.issued_count()))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

pub(crate) fn format_duration(duration: Duration) -> String {
    format!("{}.{:03}s", duration.as_secs(), duration.subsec_millis())
}

pub(crate) fn summary_lines(run: &RunSummary, latency: &LatencyReport) -> Vec<String> {
    let mut lines = Vec::new();
    let rate = success_rate_x100(run);

    match run.key {
        Some(key) => lines.push(format!("Run: #{}", key)),
        None => lines.push("Run: not stored".to_owned()),
    }
    lines.push(format!("Target: {}", run.config.target_url));
    lines.push(format!(
        "Interval: {}ms, Batch Size: {}, Max Requests: {}",
        run.config.interval_ms, run.config.batch_size, run.config.max_requests
    ));
    lines.push(format!("Duration: {}", format_duration(run.duration())));
    lines.push(format!("Total Requests: {}", run.issued_count()));
    lines.push(format!(
        "Successful: {} ({}.{:02}%)",
        run.success_count,
        rate.checked_div(PERCENT_DIVISOR).unwrap_or(0),
        rate.checked_rem(PERCENT_DIVISOR).unwrap_or(0)
    ));
    lines.push(format!("Failed: {}", run.failure_count));
    lines.push(format!("Avg Latency (ok): {}ms", latency.mean_ms));
    lines.push(format!(
        "P50/P90/P99 Latency (ok): {}ms / {}ms / {}ms",
        latency.p50_ms, latency.p90_ms, latency.p99_ms
    ));
    lines.push(format!("Max Latency (ok): {}ms", latency.max_ms));

    lines.push("Latency Distribution:".to_owned());
    for bucket in latency.buckets.as_slice() {
        lines.push(format!("  {:<9}{}", bucket.label, bucket.count));
    }

    let groups = error_groups(run);
    if !groups.is_empty() {
        lines.push("Errors:".to_owned());
        for ((name, status), (count, message)) in groups.iter().take(MAX_ERROR_LINES) {
            let status = status.map_or_else(|| "-".to_owned(), |code| code.to_string());
            lines.push(format!("  {} [{}] x{}: {}", name, status, count, message));
        }
        if groups.len() > MAX_ERROR_LINES {
            lines.push(format!(
                "  ... {} more error kinds",
                groups.len().saturating_sub(MAX_ERROR_LINES)
            ));
        }
    }

    lines
}

/// Failures grouped by name and status, with a count and the first message.
fn error_groups(run: &RunSummary) -> BTreeMap<(&str, Option<u16>), (u64, &str)> {
    let mut groups: BTreeMap<(&str, Option<u16>), (u64, &str)> = BTreeMap::new();
    for failure in &run.errors {
        let entry = groups
            .entry((failure.name.as_str(), failure.status_code))
            .or_insert((0, failure.message.as_str()));
        entry.0 = entry.0.saturating_add(1);
    }
    groups
}
