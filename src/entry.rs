use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::app::{run_history, run_local};
use crate::args::{Command, HistoryArgs, TesterArgs};
use crate::config::DEFAULT_CONFIG_FILES;
use crate::error::{AppError, AppResult, ValidationError};

enum RunPlan {
    History { args: HistoryArgs, db_path: String },
    Local(TesterArgs),
}

/// Binary entry point: parses arguments, merges the config file, installs
/// logging and drives the selected command on a multi-thread runtime.
///
/// # Errors
///
/// Returns an error when arguments or configuration are invalid, the runtime
/// cannot be built, or the selected command fails.
pub fn run() -> AppResult<()> {
    let (args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    let plan = build_plan(args, &matches)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(execute_plan(plan))
}

fn parse_args() -> AppResult<Option<(TesterArgs, ArgMatches)>> {
    let mut cmd = TesterArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = TesterArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

fn build_plan(mut args: TesterArgs, matches: &ArgMatches) -> AppResult<RunPlan> {
    if let Some(config) = crate::config::load_config(args.config.as_deref())? {
        crate::config::apply_config(&mut args, matches, &config)?;
    }

    crate::logger::init_logging(args.verbose, args.no_color);

    if let Some(command) = args.command.take() {
        match command {
            Command::History(history_args) => {
                return Ok(RunPlan::History {
                    args: history_args,
                    db_path: args.db_path,
                });
            }
        }
    }

    if args.url.is_none() {
        tracing::error!("Missing URL (set --url or provide in config).");
        return Err(AppError::validation(ValidationError::MissingUrl));
    }
    Ok(RunPlan::Local(args))
}

async fn execute_plan(plan: RunPlan) -> AppResult<()> {
    match plan {
        RunPlan::History { args, db_path } => run_history(&args, &db_path).await,
        RunPlan::Local(args) => run_local(&args).await,
    }
}
