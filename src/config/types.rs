use std::time::Duration;

use serde::Deserialize;

use crate::args::SummaryFormat;
use crate::args::parsers::parse_duration_value;
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    #[serde(alias = "interval")]
    pub interval_ms: Option<u64>,
    #[serde(alias = "burst")]
    pub batch_size: Option<u64>,
    #[serde(alias = "max", alias = "requests")]
    pub max_requests: Option<u64>,
    pub token: Option<String>,
    pub timeout: Option<DurationValue>,
    pub db_path: Option<String>,
    pub no_store: Option<bool>,
    pub summary_format: Option<SummaryFormat>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }
}
