use super::completion::{CompletionLatch, is_drained};
use super::state::{RunEvent, RunState};
use super::*;
use crate::http::{RequestExecutor, StaticToken};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

struct ScriptedExecutor {
    latency: Duration,
    fail_every: Option<u64>,
    calls: Mutex<Vec<Instant>>,
    call_count: AtomicU64,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
}

impl ScriptedExecutor {
    fn new(latency: Duration, fail_every: Option<u64>) -> Arc<Self> {
        Arc::new(Self {
            latency,
            fail_every,
            calls: Mutex::new(Vec::new()),
            call_count: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
        })
    }

    fn call_times(&self) -> Result<Vec<Instant>, String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .map_err(|_poisoned| "calls mutex poisoned".to_owned())
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(&self, _url: &Url, _headers: &HeaderMap) -> RequestOutcome {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Instant::now());
        }
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.fail_every {
            Some(every) if call % every == 0 => RequestOutcome::Failure(RequestFailure {
                status_code: Some(503),
                error_body: serde_json::json!({ "error": "unavailable", "call": call }),
                name: "HttpErrorResponse".to_owned(),
                message: format!("call {} failed", call),
            }),
            Some(_) | None => RequestOutcome::Success {
                elapsed_seconds: self.latency.as_secs_f64(),
            },
        }
    }
}

fn run_paused_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn tester(executor: Arc<ScriptedExecutor>) -> StressTester {
    StressTester::new(executor, Arc::new(StaticToken::new(Some("test-token".to_owned()))))
}

fn config(interval_ms: u64, batch_size: u64, max_requests: u64) -> Result<RunConfig, String> {
    RunConfig::new(
        "http://localhost:8080/api/v2/shops",
        interval_ms,
        batch_size,
        max_requests,
    )
    .map_err(|err| err.to_string())
}

fn check_accounting(summary: &RunSummary, max_requests: u64) -> Result<(), String> {
    let resolved = summary.success_count.saturating_add(summary.failure_count);
    if resolved != summary.issued_count() {
        return Err("resolved count does not match issued count".to_owned());
    }
    if summary.issued_count() > max_requests {
        return Err(format!(
            "issued {} exceeds cap {}",
            summary.issued_count(),
            max_requests
        ));
    }
    if u64::try_from(summary.samples.len()).ok() != Some(summary.success_count) {
        return Err("sample list does not match success count".to_owned());
    }
    if u64::try_from(summary.errors.len()).ok() != Some(summary.failure_count) {
        return Err("error list does not match failure count".to_owned());
    }
    Ok(())
}

#[test]
fn cap_splits_final_tick() -> Result<(), String> {
    run_paused_test(async {
        let executor = ScriptedExecutor::new(Duration::from_millis(10), None);
        let mut tester = tester(Arc::clone(&executor));
        let started = Instant::now();

        let handle = tester.start(config(1000, 3, 10)?).map_err(|err| err.to_string())?;
        let summary = handle.completed().await.map_err(|err| err.to_string())?;

        check_accounting(&summary, 10)?;
        if summary.issued_count() != 10 {
            return Err(format!("Expected 10 requests, got {}", summary.issued_count()));
        }

        let mut per_tick: BTreeMap<u128, u64> = BTreeMap::new();
        for call in executor.call_times()? {
            let offset = call.saturating_duration_since(started).as_millis();
            let entry = per_tick.entry(offset).or_insert(0);
            *entry = entry.saturating_add(1);
        }
        let batches: Vec<u64> = per_tick.values().copied().collect();
        if batches != vec![3, 3, 3, 1] {
            return Err(format!("Unexpected batches: {:?}", per_tick));
        }
        Ok(())
    })
}

#[test]
fn stop_before_first_tick_completes_empty() -> Result<(), String> {
    run_paused_test(async {
        let executor = ScriptedExecutor::new(Duration::from_millis(10), None);
        let mut tester = tester(Arc::clone(&executor));

        let handle = tester.start(config(1000, 3, 10)?).map_err(|err| err.to_string())?;
        handle.stop();
        let summary = handle.completed().await.map_err(|err| err.to_string())?;

        if summary.issued_count() != 0 {
            return Err(format!("Expected no requests, got {}", summary.issued_count()));
        }
        if executor.call_count.load(Ordering::SeqCst) != 0 {
            return Err("Executor should never have been called".to_owned());
        }
        Ok(())
    })
}

#[test]
fn stop_mid_run_drains_in_flight_requests() -> Result<(), String> {
    run_paused_test(async {
        let executor = ScriptedExecutor::new(Duration::from_millis(800), None);
        let mut tester = tester(Arc::clone(&executor));

        let handle = tester.start(config(1000, 3, 100)?).map_err(|err| err.to_string())?;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        tester.stop();
        tester.stop();
        let summary = handle.completed().await.map_err(|err| err.to_string())?;

        check_accounting(&summary, 100)?;
        if summary.issued_count() != 6 {
            return Err(format!("Expected 6 requests, got {}", summary.issued_count()));
        }
        if summary.success_count != 6 {
            return Err("In-flight requests should still resolve after stop".to_owned());
        }
        Ok(())
    })
}

#[test]
fn batches_overlap_when_interval_is_shorter_than_latency() -> Result<(), String> {
    run_paused_test(async {
        let executor = ScriptedExecutor::new(Duration::from_millis(100), None);
        let mut tester = tester(Arc::clone(&executor));

        let handle = tester.start(config(10, 2, 10)?).map_err(|err| err.to_string())?;
        let summary = handle.completed().await.map_err(|err| err.to_string())?;

        check_accounting(&summary, 10)?;
        let peak = executor.max_in_flight.load(Ordering::SeqCst);
        if peak <= 2 {
            return Err(format!("Expected overlapping batches, peak in flight {}", peak));
        }
        Ok(())
    })
}

#[test]
fn failures_are_counted_and_recorded() -> Result<(), String> {
    run_paused_test(async {
        let executor = ScriptedExecutor::new(Duration::from_millis(5), Some(3));
        let mut tester = tester(Arc::clone(&executor));

        let handle = tester.start(config(50, 4, 12)?).map_err(|err| err.to_string())?;
        let summary = handle.completed().await.map_err(|err| err.to_string())?;

        check_accounting(&summary, 12)?;
        if summary.failure_count != 4 || summary.success_count != 8 {
            return Err(format!(
                "Unexpected split: {} ok / {} failed",
                summary.success_count, summary.failure_count
            ));
        }
        if summary
            .errors
            .iter()
            .any(|failure| failure.status_code != Some(503))
        {
            return Err("Expected every recorded error to carry status 503".to_owned());
        }
        Ok(())
    })
}

#[test]
fn starting_a_new_run_stops_the_previous_one() -> Result<(), String> {
    run_paused_test(async {
        let executor = ScriptedExecutor::new(Duration::from_millis(10), None);
        let mut tester = tester(Arc::clone(&executor));

        let first = tester.start(config(1000, 3, 100)?).map_err(|err| err.to_string())?;
        tokio::time::sleep(Duration::from_millis(500)).await;
        let second = tester.start(config(1000, 2, 4)?).map_err(|err| err.to_string())?;

        let first_summary = first.completed().await.map_err(|err| err.to_string())?;
        let second_summary = second.completed().await.map_err(|err| err.to_string())?;

        check_accounting(&first_summary, 100)?;
        check_accounting(&second_summary, 4)?;
        if first_summary.issued_count() != 3 {
            return Err(format!(
                "Previous run should stop after its first tick, issued {}",
                first_summary.issued_count()
            ));
        }
        if second_summary.issued_count() != 4 {
            return Err(format!(
                "New run should reach its own cap, issued {}",
                second_summary.issued_count()
            ));
        }
        Ok(())
    })
}

#[test]
fn progress_reports_completed_phase() -> Result<(), String> {
    run_paused_test(async {
        let executor = ScriptedExecutor::new(Duration::from_millis(10), None);
        let mut tester = tester(executor);
        if tester.progress().phase != RunPhase::Idle {
            return Err("Expected idle before any run".to_owned());
        }

        let handle = tester.start(config(100, 5, 5)?).map_err(|err| err.to_string())?;
        let progress = handle.progress();
        let summary = handle.completed().await.map_err(|err| err.to_string())?;

        let last = *progress.borrow();
        if last.phase != RunPhase::Completed {
            return Err(format!("Expected completed phase, got {}", last.phase.as_str()));
        }
        if last.issued != summary.issued_count() || last.in_flight() != 0 {
            return Err(format!("Unexpected final progress: {:?}", last));
        }
        Ok(())
    })
}

#[test]
fn start_outside_runtime_is_rejected() -> Result<(), String> {
    let executor = ScriptedExecutor::new(Duration::from_millis(1), None);
    let mut tester = tester(executor);
    match tester.start(config(100, 1, 1)?) {
        Ok(_) => Err("Expected start without a runtime to fail".to_owned()),
        Err(_) => Ok(()),
    }
}

#[test]
fn invalid_token_declines_to_start() -> Result<(), String> {
    run_paused_test(async {
        let executor = ScriptedExecutor::new(Duration::from_millis(1), None);
        let mut tester = StressTester::new(
            executor,
            Arc::new(StaticToken::new(Some("bad\ntoken".to_owned()))),
        );
        match tester.start(config(100, 1, 1)?) {
            Ok(_) => Err("Expected invalid token to be rejected".to_owned()),
            Err(_) => Ok(()),
        }
    })
}

#[test]
fn run_config_rejects_misuse() -> Result<(), String> {
    let cases = [
        ("http://localhost", 0, 1, 1),
        ("http://localhost", 100, 0, 1),
        ("http://localhost", 100, 1, 0),
        ("ftp://localhost/file", 100, 1, 1),
        ("not a url", 100, 1, 1),
    ];
    for (url, interval, batch, max) in cases {
        if RunConfig::new(url, interval, batch, max).is_ok() {
            return Err(format!(
                "Expected ({}, {}, {}, {}) to be rejected",
                url, interval, batch, max
            ));
        }
    }
    Ok(())
}

#[test]
fn completion_requires_halt_and_fires_once() -> Result<(), String> {
    let mut state = RunState::new(Utc::now());
    let events = [
        RunEvent::Dispatched,
        RunEvent::Dispatched,
        RunEvent::Outcome(RequestOutcome::Success {
            elapsed_seconds: 0.25,
        }),
        RunEvent::Outcome(RequestOutcome::Failure(RequestFailure {
            status_code: None,
            error_body: serde_json::Value::Null,
            name: "ConnectError".to_owned(),
            message: "connection refused".to_owned(),
        })),
    ];
    for event in events {
        if state.apply(event) {
            return Err("Completed before dispatch halted".to_owned());
        }
    }
    if state.progress().phase != RunPhase::Running {
        return Err("Expected running phase before halt".to_owned());
    }
    if !state.apply(RunEvent::Halted) {
        return Err("Expected completion once halted and drained".to_owned());
    }
    if state.apply(RunEvent::Halted) {
        return Err("Completion must be signaled only once".to_owned());
    }
    if state.progress().phase != RunPhase::Completed {
        return Err("Expected completed phase".to_owned());
    }
    Ok(())
}

#[test]
fn completion_waits_for_outstanding_requests_after_halt() -> Result<(), String> {
    let mut state = RunState::new(Utc::now());
    state.apply(RunEvent::Dispatched);
    state.apply(RunEvent::Dispatched);
    if state.apply(RunEvent::Halted) {
        return Err("Completed with requests still outstanding".to_owned());
    }
    if state.progress().phase != RunPhase::Draining {
        return Err("Expected draining phase".to_owned());
    }
    if state.on_success(0.1) {
        return Err("Completed with one request outstanding".to_owned());
    }
    if !state.on_success(0.2) {
        return Err("Expected completion on the last outcome".to_owned());
    }
    Ok(())
}

#[test]
fn latch_is_edge_triggered() -> Result<(), String> {
    if is_drained(false, 3, 3) || !is_drained(true, 3, 3) || is_drained(true, 3, 2) {
        return Err("Unexpected drain condition".to_owned());
    }
    let mut latch = CompletionLatch::default();
    let observations = [
        latch.observe(true, 2, 1),
        latch.observe(true, 2, 2),
        latch.observe(true, 2, 2),
    ];
    if observations != [false, true, false] {
        return Err(format!("Unexpected observations: {:?}", observations));
    }
    Ok(())
}
