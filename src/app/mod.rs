mod history;
mod progress;
mod runner;
mod summary;


pub(crate) use history::run_history;
pub(crate) use runner::run_local;
