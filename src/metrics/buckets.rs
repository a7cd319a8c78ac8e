use serde::Serialize;

/// Upper bounds (exclusive, microseconds) and labels of the latency ranges.
/// The last range is open-ended.
const RANGES: [(Option<u64>, &str); 6] = [
    (Some(1_000_000), "< 1s"),
    (Some(2_000_000), "1s ~ 2s"),
    (Some(3_000_000), "2s ~ 3s"),
    (Some(5_000_000), "3s ~ 5s"),
    (Some(10_000_000), "5s ~ 10s"),
    (None, "> 10s"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatencyBucket {
    pub label: &'static str,
    pub count: u64,
}

/// Request counts per latency range, in ascending range order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LatencyBuckets {
    buckets: Vec<LatencyBucket>,
}

impl Default for LatencyBuckets {
    fn default() -> Self {
        Self {
            buckets: RANGES
                .iter()
                .map(|&(_, label)| LatencyBucket { label, count: 0 })
                .collect(),
        }
    }
}

impl LatencyBuckets {
    pub fn record(&mut self, latency_us: u64) {
        let index = RANGES
            .iter()
            .position(|(upper, _)| upper.is_none_or(|upper| latency_us < upper))
            .unwrap_or(RANGES.len().saturating_sub(1));
        if let Some(bucket) = self.buckets.get_mut(index) {
            bucket.count = bucket.count.saturating_add(1);
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[LatencyBucket] {
        &self.buckets
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.buckets
            .iter()
            .fold(0u64, |total, bucket| total.saturating_add(bucket.count))
    }
}
