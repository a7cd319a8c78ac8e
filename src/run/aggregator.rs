use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::{RunEvent, RunState};
use super::types::{RunConfig, RunProgress, RunSummary};

pub(crate) struct AggregatorChannels {
    pub events_rx: mpsc::UnboundedReceiver<RunEvent>,
    pub progress_tx: watch::Sender<RunProgress>,
    pub completion_tx: oneshot::Sender<RunSummary>,
}

/// Spawns the task that owns the run state. It is the only writer, so the
/// counters, the sample/error lists and the completion check never race.
pub(crate) fn spawn_aggregator(
    config: RunConfig,
    state: RunState,
    channels: AggregatorChannels,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let AggregatorChannels {
            mut events_rx,
            progress_tx,
            completion_tx,
        } = channels;
        let mut state = state;

        while let Some(event) = events_rx.recv().await {
            let completed = state.apply(event);
            progress_tx.send_replace(state.progress());
            if completed {
                let summary = state.into_summary(config, Utc::now());
                info!(
                    "Run against {} completed: {} ok, {} failed.",
                    summary.config.target_url, summary.success_count, summary.failure_count
                );
                if completion_tx.send(summary).is_err() {
                    debug!("Completion receiver dropped before the run finished.");
                }
                return;
            }
        }

        warn!(
            "Run event stream closed before the run drained ({:?}).",
            state.progress()
        );
    })
}
