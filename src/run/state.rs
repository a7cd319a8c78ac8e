use chrono::{DateTime, Utc};

use super::completion::CompletionLatch;
use super::types::{RequestFailure, RequestOutcome, RunConfig, RunPhase, RunProgress, RunSummary};

/// Everything the aggregation task learns about a run, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RunEvent {
    /// A request slot was reserved and the request spawned.
    Dispatched,
    Outcome(RequestOutcome),
    /// The timer stopped; no further `Dispatched` events follow.
    Halted,
}

/// Mutable bookkeeping for one run. Owned by a single task, so each update
/// and the completion check that follows it happen as one step.
#[derive(Debug)]
pub(crate) struct RunState {
    issued_count: u64,
    success_count: u64,
    failure_count: u64,
    start_time: DateTime<Utc>,
    dispatch_halted: bool,
    samples: Vec<f64>,
    errors: Vec<RequestFailure>,
    latch: CompletionLatch,
}

impl RunState {
    pub(crate) fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            issued_count: 0,
            success_count: 0,
            failure_count: 0,
            start_time,
            dispatch_halted: false,
            samples: Vec::new(),
            errors: Vec::new(),
            latch: CompletionLatch::default(),
        }
    }

    /// Applies one event. Returns `true` when this event completed the run.
    pub(crate) fn apply(&mut self, event: RunEvent) -> bool {
        match event {
            RunEvent::Dispatched => {
                self.issued_count = self.issued_count.saturating_add(1);
                false
            }
            RunEvent::Outcome(RequestOutcome::Success { elapsed_seconds }) => {
                self.on_success(elapsed_seconds)
            }
            RunEvent::Outcome(RequestOutcome::Failure(failure)) => self.on_failure(failure),
            RunEvent::Halted => self.halt_dispatch(),
        }
    }

    pub(crate) fn on_success(&mut self, elapsed_seconds: f64) -> bool {
        self.success_count = self.success_count.saturating_add(1);
        self.samples.push(elapsed_seconds);
        self.check_complete()
    }

    pub(crate) fn on_failure(&mut self, failure: RequestFailure) -> bool {
        self.failure_count = self.failure_count.saturating_add(1);
        self.errors.push(failure);
        self.check_complete()
    }

    pub(crate) fn halt_dispatch(&mut self) -> bool {
        self.dispatch_halted = true;
        self.check_complete()
    }

    fn check_complete(&mut self) -> bool {
        self.latch
            .observe(self.dispatch_halted, self.issued_count, self.resolved())
    }

    const fn resolved(&self) -> u64 {
        self.success_count.saturating_add(self.failure_count)
    }

    pub(crate) const fn phase(&self) -> RunPhase {
        if self.latch.has_signaled() {
            RunPhase::Completed
        } else if self.dispatch_halted {
            RunPhase::Draining
        } else {
            RunPhase::Running
        }
    }

    pub(crate) const fn progress(&self) -> RunProgress {
        RunProgress {
            phase: self.phase(),
            issued: self.issued_count,
            succeeded: self.success_count,
            failed: self.failure_count,
        }
    }

    pub(crate) fn into_summary(self, config: RunConfig, end_time: DateTime<Utc>) -> RunSummary {
        RunSummary {
            key: None,
            config,
            start_time: self.start_time,
            end_time,
            success_count: self.success_count,
            failure_count: self.failure_count,
            samples: self.samples,
            errors: self.errors,
        }
    }
}
