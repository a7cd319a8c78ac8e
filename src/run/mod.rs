//! Run lifecycle: interval-driven dispatch, result aggregation and
//! completion detection.
mod aggregator;
mod completion;
mod scheduler;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use scheduler::{RunHandle, StressTester};
pub use types::{
    RequestFailure, RequestOutcome, RunConfig, RunPhase, RunProgress, RunSummary,
};
