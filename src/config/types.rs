use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::args::HttpMethod;
use crate::catalog::{Classification, ErrorVariant};
use crate::error::ValidationError;

/// Raw configuration as written in the YAML/JSON/TOML file. Every field is
/// optional here; [`super::TrafficConfig::resolve`] applies defaults and
/// validation.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(alias = "target")]
    pub base_url: Option<String>,
    #[serde(alias = "rps")]
    pub rate: Option<f64>,
    pub concurrency: Option<usize>,
    pub duration: Option<DurationValue>,
    pub summary_interval: Option<DurationValue>,
    #[serde(alias = "timeout_seconds")]
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub grace_period: Option<DurationValue>,
    pub traffic_type: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    /// Placeholder pools; values are strings, numbers or booleans.
    pub vars: Option<BTreeMap<String, Vec<serde_json::Value>>>,
    pub seed: Option<u64>,
    pub endpoints: Option<Vec<EndpointConfig>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub name: Option<String>,
    #[serde(default = "default_method")]
    pub method: HttpMethod,
    pub path: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub classification: Classification,
    pub payload: Option<serde_json::Value>,
    pub error_path: Option<String>,
    pub error_rate: Option<f64>,
    pub error_variants: Option<Vec<ErrorVariant>>,
    pub headers: Option<BTreeMap<String, String>>,
}

const fn default_method() -> HttpMethod {
    HttpMethod::Get
}

const fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
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
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }

    pub(crate) fn to_interval(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_interval_value(text),
        }
    }
}
