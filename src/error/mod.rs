mod app;
mod config;
mod http;
mod run;
mod store;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::HttpError;
pub use run::RunError;
pub use store::StoreError;
pub use validation::ValidationError;
