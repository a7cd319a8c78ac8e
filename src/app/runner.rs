use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::{
    args::TesterArgs,
    error::AppResult,
    http::{HttpExecutor, StaticToken},
    run::{RunConfig, RunSummary, StressTester},
    shutdown_handlers::setup_signal_shutdown_handler,
    store::{RunStore, SqliteRunStore},
};

use super::{progress, summary};

pub(crate) async fn run_local(args: &TesterArgs) -> AppResult<()> {
    let config = RunConfig::from_args(args)?;
    let executor = HttpExecutor::new(args.request_timeout)?;
    let tokens = StaticToken::new(args.token.clone());
    let mut tester = StressTester::new(Arc::new(executor), Arc::new(tokens));

    let handle = tester.start(config)?;
    let (done_tx, done_rx) = oneshot::channel();
    let signal_handle = setup_signal_shutdown_handler(&handle.abort_signal(), done_rx);
    let progress_handle = progress::setup_progress_logger(handle.progress());

    let completed = handle.completed().await;
    drop(done_tx.send(()));
    signal_handle.await?;
    let run_summary = completed?;
    progress_handle.await?;

    let run_summary = if args.no_store {
        info!("Run history disabled; summary not stored.");
        run_summary
    } else {
        let mut store = SqliteRunStore::new(&args.db_path);
        persist_summary(&mut store, run_summary).await
    };

    summary::print_summary(&run_summary, args.summary_format)
}

/// Stores the summary and returns it with its assigned key. Store failures
/// are logged and the summary is returned unkeyed.
pub(crate) async fn persist_summary(store: &mut dyn RunStore, run_summary: RunSummary) -> RunSummary {
    if let Err(err) = store.initialize().await {
        warn!("Run store unavailable, summary not stored: {}", err);
        return run_summary;
    }
    match store.insert(&run_summary).await {
        Ok(key) => run_summary.with_key(key),
        Err(err) => {
            warn!("Failed to store run summary: {}", err);
            run_summary
        }
    }
}
