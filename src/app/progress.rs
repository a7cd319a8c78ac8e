use tokio::sync::watch;
use tracing::debug;

use crate::run::{RunPhase, RunProgress};

/// Logs every progress change of one run until it completes or its
/// aggregator goes away.
pub(crate) fn setup_progress_logger(
    mut progress_rx: watch::Receiver<RunProgress>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_phase = RunPhase::Idle;
        while progress_rx.changed().await.is_ok() {
            let progress = *progress_rx.borrow_and_update();
            if progress.phase != last_phase {
                debug!("Run phase: {}.", progress.phase.as_str());
                last_phase = progress.phase;
            }
            debug!(
                "Progress: {} issued, {} ok, {} failed, {} in flight.",
                progress.issued,
                progress.succeeded,
                progress.failed,
                progress.in_flight()
            );
            if progress.phase == RunPhase::Completed {
                break;
            }
        }
    })
}
