use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::shutdown::AbortSignal;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit status used when a second signal cuts the drain short.
const FORCED_EXIT_CODE: i32 = 130;

/// Handles Ctrl+C and SIGTERM until `done` resolves.
///
/// The first signal fires `abort` and lets in-flight requests drain. A
/// signal that arrives once the abort has already fired (from a signal or
/// from reaching the request cap) exits the process without waiting.
pub fn setup_signal_shutdown_handler(
    abort: &AbortSignal,
    mut done: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let abort = abort.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        loop {
            #[cfg(unix)]
            let received = tokio::select! {
                biased;
                _ = &mut done => break,
                _ = tokio::signal::ctrl_c() => "Ctrl+C",
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => "SIGTERM",
            };

            #[cfg(not(unix))]
            let received = tokio::select! {
                biased;
                _ = &mut done => break,
                _ = tokio::signal::ctrl_c() => "Ctrl+C",
            };

            on_signal(&abort, received);
        }
    })
}

fn on_signal(abort: &AbortSignal, received: &str) {
    if abort.fire() {
        info!(
            "{} received; stopping dispatch. Send it again to exit without waiting for in-flight requests.",
            received
        );
        return;
    }
    warn!(
        "{} received while draining; exiting without waiting for in-flight requests.",
        received
    );
    std::process::exit(FORCED_EXIT_CODE);
}
