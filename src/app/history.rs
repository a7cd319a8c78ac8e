use chrono::SecondsFormat;

use crate::{
    args::HistoryArgs,
    error::AppResult,
    run::RunSummary,
    store::{RunStore, SqliteRunStore},
};

use super::summary::format_duration;

pub(crate) async fn run_history(args: &HistoryArgs, db_path: &str) -> AppResult<()> {
    let runs = load_history(args, db_path).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No stored runs.");
        return Ok(());
    }
    for run in &runs {
        println!("{}", history_line(run));
    }
    Ok(())
}

/// Reads stored runs. A missing store file means no history; it is not
/// created just to be listed.
pub(crate) async fn load_history(args: &HistoryArgs, db_path: &str) -> AppResult<Vec<RunSummary>> {
    let mut store = SqliteRunStore::new(db_path);
    if !store.path().exists() {
        return Ok(Vec::new());
    }
    match args.url.as_deref() {
        Some(url) => store.list_by_url(&normalize_url(url)).await,
        None => store.list_all().await,
    }
}

/// Stored URLs are in their parsed form, so match filters the same way.
pub(crate) fn normalize_url(raw: &str) -> String {
    url::Url::parse(raw.trim()).map_or_else(|_| raw.trim().to_owned(), |url| url.to_string())
}

pub(crate) fn history_line(run: &RunSummary) -> String {
    let key = run
        .key
        .map_or_else(|| "-".to_owned(), |key| key.to_string());
    format!(
        "#{} {} {} interval={}ms batch={} max={} issued={} ok={} failed={} duration={}",
        key,
        run.start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        run.config.target_url,
        run.config.interval_ms,
        run.config.batch_size,
        run.config.max_requests,
        run.issued_count(),
        run.success_count,
        run.failure_count,
        format_duration(run.duration())
    )
}
