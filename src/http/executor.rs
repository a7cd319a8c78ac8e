use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode, Url, header::HeaderMap};
use tokio::time::Instant;
use tracing::debug;

use crate::args::DEFAULT_USER_AGENT;
use crate::error::HttpError;
use crate::run::{RequestFailure, RequestOutcome};

/// Issues one GET and reports how it went. Implementations must not panic or
/// return early errors: every call resolves into a [`RequestOutcome`].
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, url: &Url, headers: &HeaderMap) -> RequestOutcome;
}

/// `reqwest`-backed executor. No timeout unless one is configured.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    /// Builds the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend or client cannot be initialized.
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, HttpError> {
        let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, url: &Url, headers: &HeaderMap) -> RequestOutcome {
        let started = Instant::now();
        let response = match self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return RequestOutcome::Failure(transport_failure(&err)),
        };

        let status = response.status();
        if !status.is_success() {
            let error_body = match response.bytes().await {
                Ok(bytes) => decode_error_body(&bytes),
                Err(err) => {
                    debug!("Failed to read error body from {}: {}", url, err);
                    serde_json::Value::Null
                }
            };
            return RequestOutcome::Failure(RequestFailure {
                status_code: Some(status.as_u16()),
                error_body,
                name: "HttpErrorResponse".to_owned(),
                message: http_failure_message(url, status),
            });
        }

        match drain_response_body(response).await {
            Ok(_bytes) => RequestOutcome::Success {
                elapsed_seconds: started.elapsed().as_secs_f64(),
            },
            Err(err) => RequestOutcome::Failure(transport_failure(&err)),
        }
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}

pub(super) fn decode_error_body(bytes: &[u8]) -> serde_json::Value {
    if bytes.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_not_json| {
        serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
    })
}

fn http_failure_message(url: &Url, status: StatusCode) -> String {
    format!(
        "Http failure response for {}: {} {}",
        url,
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
}

fn transport_failure(err: &reqwest::Error) -> RequestFailure {
    let name = if err.is_timeout() {
        "TimeoutError"
    } else if err.is_connect() {
        "ConnectError"
    } else {
        "TransportError"
    };
    RequestFailure {
        status_code: err.status().map(|status| status.as_u16()),
        error_body: serde_json::Value::Null,
        name: name.to_owned(),
        message: err.to_string(),
    }
}
