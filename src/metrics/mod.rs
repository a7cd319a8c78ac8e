//! Latency statistics of a completed run.
mod buckets;
mod histogram;


use std::time::Duration;

use serde::Serialize;

pub use buckets::{LatencyBucket, LatencyBuckets};
pub use histogram::LatencyHistogram;

/// Percentiles and range counts over the success samples of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LatencyReport {
    pub count: u64,
    pub mean_ms: u64,
    pub p50_ms: u64,
    pub p90_ms: u64,
    pub p99_ms: u64,
    pub max_ms: u64,
    pub buckets: LatencyBuckets,
}

impl LatencyReport {
    /// Builds the report from latency samples in seconds. Negative or
    /// non-finite samples are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created or a value cannot
    /// be recorded.
    pub fn from_samples(samples: &[f64]) -> Result<Self, String> {
        let mut histogram = LatencyHistogram::new()?;
        let mut buckets = LatencyBuckets::default();
        let mut total_us: u128 = 0;

        for latency_us in samples.iter().copied().filter_map(seconds_to_micros) {
            histogram.record(latency_us)?;
            buckets.record(latency_us);
            total_us = total_us.saturating_add(u128::from(latency_us));
        }

        let count = histogram.count();
        let mean_us = total_us
            .checked_div(u128::from(count))
            .map_or(0, |mean| u64::try_from(mean).unwrap_or(u64::MAX));
        let (p50, p90, p99) = histogram.percentiles();
        let max = if count == 0 { 0 } else { histogram.max() };

        Ok(Self {
            count,
            mean_ms: micros_to_millis(mean_us),
            p50_ms: micros_to_millis(p50),
            p90_ms: micros_to_millis(p90),
            p99_ms: micros_to_millis(p99),
            max_ms: micros_to_millis(max),
            buckets,
        })
    }
}

fn seconds_to_micros(seconds: f64) -> Option<u64> {
    let duration = Duration::try_from_secs_f64(seconds).ok()?;
    Some(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
}

fn micros_to_millis(value: u64) -> u64 {
    value.checked_div(1_000).unwrap_or(0)
}
