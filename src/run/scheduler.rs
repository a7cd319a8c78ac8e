use std::sync::Arc;

use chrono::Utc;
use reqwest::header::HeaderMap;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, RunError};
use crate::http::{RequestExecutor, TokenProvider, build_request_headers};
use crate::shutdown::{AbortReceiver, AbortSignal, wait_for_abort};

use super::aggregator::{AggregatorChannels, spawn_aggregator};
use super::state::{RunEvent, RunState};
use super::types::{RequestFailure, RequestOutcome, RunConfig, RunPhase, RunProgress, RunSummary};

/// Starts and stops runs against a pluggable executor.
///
/// Only one run is active at a time: starting a new run fires the abort
/// signal of the previous one. The previous run keeps its own state, drains
/// its in-flight requests and still reports completion on its own handle.
pub struct StressTester {
    executor: Arc<dyn RequestExecutor>,
    tokens: Arc<dyn TokenProvider>,
    active: Option<ActiveRun>,
}

struct ActiveRun {
    abort: AbortSignal,
    progress: watch::Receiver<RunProgress>,
}

impl StressTester {
    #[must_use]
    pub fn new(executor: Arc<dyn RequestExecutor>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            executor,
            tokens,
            active: None,
        }
    }

    /// Starts a run. Tick 0 fires immediately, then one tick per interval.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime or when the
    /// request headers cannot be built from the configured token.
    pub fn start(&mut self, config: RunConfig) -> AppResult<RunHandle> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(AppError::run(RunError::NoRuntime));
        }
        build_request_headers(self.tokens.as_ref())?;

        if let Some(previous) = self.active.take()
            && previous.abort.fire()
        {
            info!("Stopping dispatch of the previous run before starting a new one.");
        }

        let abort = AbortSignal::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = watch::channel(RunProgress {
            phase: RunPhase::Running,
            ..RunProgress::default()
        });
        let (completion_tx, completion_rx) = oneshot::channel();

        info!(
            "Starting run: {} every {}ms, batch {}, max {} requests.",
            config.target_url, config.interval_ms, config.batch_size, config.max_requests
        );

        let state = RunState::new(Utc::now());
        let aggregator = spawn_aggregator(
            config.clone(),
            state,
            AggregatorChannels {
                events_rx,
                progress_tx,
                completion_tx,
            },
        );

        let dispatcher = Dispatcher {
            config,
            executor: Arc::clone(&self.executor),
            tokens: Arc::clone(&self.tokens),
            events_tx,
            abort: abort.clone(),
        };
        let abort_rx = abort.subscribe();
        let scheduler = tokio::spawn(dispatcher.run(abort_rx));

        self.active = Some(ActiveRun {
            abort: abort.clone(),
            progress: progress_rx.clone(),
        });

        Ok(RunHandle {
            abort,
            progress: progress_rx,
            completion: completion_rx,
            scheduler,
            aggregator,
        })
    }

    /// Stops dispatch of the active run. Idempotent; in-flight requests still
    /// resolve before the run completes.
    pub fn stop(&self) {
        if let Some(active) = self.active.as_ref()
            && active.abort.fire()
        {
            info!("Stop requested; draining in-flight requests.");
        }
    }

    /// Progress of the most recently started run, or an idle snapshot.
    #[must_use]
    pub fn progress(&self) -> RunProgress {
        self.active
            .as_ref()
            .map(|active| *active.progress.borrow())
            .unwrap_or_default()
    }
}

/// Caller side of one run.
pub struct RunHandle {
    abort: AbortSignal,
    progress: watch::Receiver<RunProgress>,
    completion: oneshot::Receiver<RunSummary>,
    scheduler: JoinHandle<()>,
    aggregator: JoinHandle<()>,
}

impl RunHandle {
    /// Fires this run's abort signal. Idempotent.
    pub fn stop(&self) {
        if self.abort.fire() {
            info!("Stop requested; draining in-flight requests.");
        }
    }

    #[must_use]
    pub fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }

    #[must_use]
    pub fn progress(&self) -> watch::Receiver<RunProgress> {
        self.progress.clone()
    }

    /// Waits for the one-shot completion signal and returns the run summary.
    ///
    /// # Errors
    ///
    /// Returns an error when the run's tasks ended without signaling
    /// completion (for example after a panic inside a task).
    pub async fn completed(self) -> AppResult<RunSummary> {
        let RunHandle {
            completion,
            scheduler,
            aggregator,
            ..
        } = self;
        let summary = completion
            .await
            .map_err(|_closed| AppError::run(RunError::CompletionDropped))?;
        scheduler.await?;
        aggregator.await?;
        Ok(summary)
    }
}

struct Dispatcher {
    config: RunConfig,
    executor: Arc<dyn RequestExecutor>,
    tokens: Arc<dyn TokenProvider>,
    events_tx: mpsc::UnboundedSender<RunEvent>,
    abort: AbortSignal,
}

impl Dispatcher {
    /// Timer loop. Never waits on requests; each tick only reserves slots and
    /// spawns. Ends when the abort signal fires, from outside or from hitting
    /// the request cap.
    async fn run(self, mut abort_rx: AbortReceiver) {
        let batch_size = self.config.batch_size.get();
        let max_requests = self.config.max_requests.get();
        let mut ticker = interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut issued: u64 = 0;
        let mut tick_index: u64 = 0;

        'ticks: loop {
            if self.abort.is_fired() {
                break;
            }
            tokio::select! {
                biased;
                () = wait_for_abort(&mut abort_rx) => break,
                _ = ticker.tick() => {}
            }

            let mut dispatched_this_tick: u64 = 0;
            for _ in 0..batch_size {
                if issued == max_requests {
                    debug!(
                        "Tick {} reached the cap of {} requests.",
                        tick_index, max_requests
                    );
                    drop(self.abort.fire());
                    break 'ticks;
                }
                issued = issued.saturating_add(1);
                dispatched_this_tick = dispatched_this_tick.saturating_add(1);
                self.dispatch();
            }
            debug!(
                "Tick {} dispatched {} requests ({} total).",
                tick_index, dispatched_this_tick, issued
            );
            tick_index = tick_index.saturating_add(1);
        }

        debug!("Dispatch halted after {} requests.", issued);
        if self.events_tx.send(RunEvent::Halted).is_err() {
            warn!("Run aggregator stopped before dispatch halted.");
        }
    }

    /// Reserves the slot first, then spawns the request. The reservation event
    /// is queued before the request can report back, so the aggregator always
    /// counts a request as issued before seeing its outcome.
    fn dispatch(&self) {
        if self.events_tx.send(RunEvent::Dispatched).is_err() {
            warn!("Run aggregator stopped; request outcome will be lost.");
        }
        let executor = Arc::clone(&self.executor);
        let tokens = Arc::clone(&self.tokens);
        let url = self.config.target_url.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = match build_request_headers(tokens.as_ref()) {
                Ok(headers) => execute_request(executor.as_ref(), &url, &headers).await,
                Err(err) => RequestOutcome::Failure(RequestFailure {
                    status_code: None,
                    error_body: serde_json::Value::Null,
                    name: "InvalidHeader".to_owned(),
                    message: err.to_string(),
                }),
            };
            if events_tx.send(RunEvent::Outcome(outcome)).is_err() {
                debug!("Outcome arrived after the run aggregator stopped.");
            }
        });
    }
}

async fn execute_request(
    executor: &dyn RequestExecutor,
    url: &url::Url,
    headers: &HeaderMap,
) -> RequestOutcome {
    let outcome = executor.execute(url, headers).await;
    if let RequestOutcome::Failure(failure) = &outcome {
        debug!(
            "Request to {} failed: {} ({})",
            url, failure.name, failure.message
        );
    }
    outcome
}
