//! Core library for the `volley` CLI.
//!
//! `volley` fires batches of HTTP GET requests at one endpoint on a fixed
//! interval until a request cap is reached, aggregates latencies and failures,
//! and keeps a history of completed runs in SQLite. The building blocks are
//! exposed here: argument and config types, the request executor, the run
//! scheduler and the run store.
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod metrics;
pub mod run;
pub mod shutdown;
pub mod store;

mod app;
mod logger;
mod shutdown_handlers;
