//! Timed HTTP GET execution and request headers.
mod executor;
mod headers;


pub use executor::{HttpExecutor, RequestExecutor};
pub use headers::{StaticToken, TokenProvider, build_request_headers};
