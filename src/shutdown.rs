use std::sync::Arc;

use tokio::sync::watch;

pub type AbortReceiver = watch::Receiver<bool>;

/// One-shot stop flag shared by the scheduler, the caller and signal handlers.
///
/// Firing is idempotent: only the first call flips the flag, later calls are
/// no-ops. Receivers observe the flag through `watch` so a late subscriber
/// still sees an abort that fired before it subscribed.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fires the signal. Returns `true` when this call was the one that fired it.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    #[must_use]
    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> AbortReceiver {
        self.tx.subscribe()
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once the abort flag is set. Also resolves if every sender is gone,
/// since nothing could fire it afterwards.
pub async fn wait_for_abort(rx: &mut AbortReceiver) {
    if rx.wait_for(|fired| *fired).await.is_err() {
        tracing::debug!("Abort signal dropped; treating as fired.");
    }
}
