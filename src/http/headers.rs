use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::error::HttpError;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Supplies the bearer credential at request time. Rotation is up to the
/// implementor; the scheduler only asks for the current value.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed token taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        Self { token }
    }
}

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Builds the header set sent with every request.
///
/// # Errors
///
/// Returns an error when the token contains characters not allowed in a
/// header value.
pub fn build_request_headers(tokens: &dyn TokenProvider) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
    if let Some(token) = tokens.bearer_token() {
        let value = bearer_value(&token);
        let mut header =
            HeaderValue::from_str(&value).map_err(|err| HttpError::InvalidHeaderValue {
                name: "Authorization",
                source: err,
            })?;
        header.set_sensitive(true);
        headers.insert(AUTHORIZATION, header);
    }
    Ok(headers)
}

fn bearer_value(token: &str) -> String {
    if token.starts_with("Bearer ") {
        token.to_owned()
    } else {
        format!("Bearer {}", token)
    }
}
