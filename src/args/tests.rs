use super::*;
use crate::args::parsers::parse_duration_value;
use clap::Parser;
use std::time::Duration;

fn parse_test_args<I, T>(args: I) -> Result<TesterArgs, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    TesterArgs::try_parse_from(args).map_err(|err| format!("parse failed: {}", err))
}

#[test]
fn parse_args_defaults() -> Result<(), String> {
    let args = parse_test_args(["volley", "-u", "http://localhost"])?;

    let checks = [
        (
            args.url.as_deref() == Some("http://localhost"),
            "Unexpected url",
        ),
        (args.interval_ms.get() == 1000, "Unexpected interval_ms"),
        (args.batch_size.get() == 3, "Unexpected batch_size"),
        (args.max_requests.get() == 10, "Unexpected max_requests"),
        (
            args.request_timeout.is_none(),
            "Expected request_timeout to be None",
        ),
        (args.db_path == default_db_path(), "Unexpected db_path"),
        (!args.no_store, "Expected no_store to be false"),
        (
            args.summary_format == SummaryFormat::Text,
            "Expected text summary",
        ),
        (args.config.is_none(), "Expected config to be None"),
        (!args.verbose, "Expected verbose to be false"),
        (args.command.is_none(), "Expected no subcommand"),
    ];

    for (ok, msg) in checks {
        if !ok {
            return Err(msg.to_owned());
        }
    }

    Ok(())
}

#[test]
fn parse_args_run_options() -> Result<(), String> {
    let args = parse_test_args([
        "volley",
        "--url",
        "http://localhost:8080/api",
        "--interval",
        "250",
        "--batch-size",
        "5",
        "--max-requests",
        "42",
        "--token",
        "secret",
        "--timeout",
        "3s",
        "--summary-format",
        "json",
        "--no-store",
    ])?;

    if args.interval_ms.get() != 250 {
        return Err(format!("Unexpected interval: {}", args.interval_ms));
    }
    if args.batch_size.get() != 5 {
        return Err(format!("Unexpected batch size: {}", args.batch_size));
    }
    if args.max_requests.get() != 42 {
        return Err(format!("Unexpected max requests: {}", args.max_requests));
    }
    if args.token.as_deref() != Some("secret") {
        return Err("Unexpected token".to_owned());
    }
    if args.request_timeout != Some(Duration::from_secs(3)) {
        return Err("Unexpected timeout".to_owned());
    }
    if args.summary_format != SummaryFormat::Json {
        return Err("Expected json summary".to_owned());
    }
    if !args.no_store {
        return Err("Expected no_store".to_owned());
    }
    Ok(())
}

#[test]
fn parse_args_rejects_zero_batch_size() -> Result<(), String> {
    match parse_test_args(["volley", "-u", "http://localhost", "-b", "0"]) {
        Ok(_) => Err("Expected batch size 0 to be rejected".to_owned()),
        Err(_) => Ok(()),
    }
}

#[test]
fn parse_args_rejects_zero_max_requests() -> Result<(), String> {
    match parse_test_args(["volley", "-u", "http://localhost", "-n", "0"]) {
        Ok(_) => Err("Expected max requests 0 to be rejected".to_owned()),
        Err(_) => Ok(()),
    }
}

#[test]
fn parse_history_subcommand() -> Result<(), String> {
    let args = parse_test_args(["volley", "history", "--url", "http://a", "--json"])?;
    match args.command {
        Some(Command::History(history)) => {
            if history.url.as_deref() != Some("http://a") {
                return Err("Unexpected history url".to_owned());
            }
            if !history.json {
                return Err("Expected json flag".to_owned());
            }
            Ok(())
        }
        None => Err("Expected history subcommand".to_owned()),
    }
}

#[test]
fn parse_duration_units() -> Result<(), String> {
    let cases = [
        ("500ms", Duration::from_millis(500)),
        ("2s", Duration::from_secs(2)),
        ("7", Duration::from_secs(7)),
        ("1m", Duration::from_secs(60)),
        ("1h", Duration::from_secs(3600)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_value(input).map_err(|err| err.to_string())?;
        if parsed != expected {
            return Err(format!("Unexpected duration for {}: {:?}", input, parsed));
        }
    }
    Ok(())
}

#[test]
fn parse_duration_rejects_bad_input() -> Result<(), String> {
    for input in ["", "ms", "0s", "5d"] {
        if parse_duration_value(input).is_ok() {
            return Err(format!("Expected '{}' to be rejected", input));
        }
    }
    Ok(())
}
