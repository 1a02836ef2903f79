use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::args::TrafficArgs;
use crate::catalog::{Endpoint, EndpointCatalog, TemplateVars};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::{ConfigFile, DurationValue};

const DEFAULT_RATE: f64 = 1.0;
const DEFAULT_CONCURRENCY: usize = 10;
const DEFAULT_SUMMARY_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
const DEFAULT_TRAFFIC_TYPE: &str = "mixed";

/// Values supplied on the command line. They win over the config file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub rate: Option<f64>,
    pub duration: Option<Duration>,
    pub concurrency: Option<usize>,
    pub summary_interval: Option<Duration>,
    pub timeout: Option<Duration>,
    pub grace_period: Option<Duration>,
    pub seed: Option<u64>,
    pub headers: Vec<(String, String)>,
}

impl From<&TrafficArgs> for ConfigOverrides {
    fn from(args: &TrafficArgs) -> Self {
        Self {
            rate: args.rate.map(|rate| rate.get()),
            duration: args.duration,
            concurrency: args.concurrency.map(|value| value.get()),
            summary_interval: args.summary_interval,
            timeout: args.timeout,
            grace_period: args.grace_period,
            seed: args.seed,
            headers: args.headers.clone(),
        }
    }
}

/// Fully resolved, validated settings. Built once at startup and read-only
/// for the rest of the run.
#[derive(Debug)]
pub struct TrafficConfig {
    pub base_url: String,
    pub rate: f64,
    pub concurrency: usize,
    pub duration: Option<Duration>,
    /// Zero disables periodic summaries; the final summary is always logged.
    pub summary_interval: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub grace_period: Duration,
    pub traffic_type: String,
    pub headers: Vec<(String, String)>,
    pub vars: TemplateVars,
    pub seed: Option<u64>,
    pub catalog: EndpointCatalog,
}

impl TrafficConfig {
    /// Applies defaults and overrides to a raw config and validates it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a required field is missing or any
    /// value is out of range (empty endpoint list, non-positive rate, zero
    /// concurrency, bad weights, malformed URL or headers).
    pub fn resolve(file: ConfigFile, overrides: &ConfigOverrides) -> AppResult<Self> {
        let raw_url = file
            .base_url
            .as_deref()
            .ok_or(ConfigError::MissingField { field: "base_url" })?;
        let base_url = normalize_base_url(raw_url)?;

        let rate = overrides.rate.or(file.rate).unwrap_or(DEFAULT_RATE);
        if !rate.is_finite() || rate <= 0.0 {
            return Err(AppError::config(ConfigError::RateMustBePositive {
                value: rate,
            }));
        }

        let concurrency = overrides
            .concurrency
            .or(file.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(AppError::config(ConfigError::ConcurrencyMustBePositive));
        }

        let duration = match overrides.duration {
            Some(duration) => Some(duration),
            None => optional_duration(file.duration.as_ref(), "duration")?,
        };
        let summary_interval = match overrides.summary_interval {
            Some(interval) => interval,
            None => optional_interval(file.summary_interval.as_ref(), "summary_interval")?
                .unwrap_or(DEFAULT_SUMMARY_INTERVAL),
        };
        let request_timeout = match overrides.timeout {
            Some(timeout) => timeout,
            None => optional_duration(file.timeout.as_ref(), "timeout")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        };
        let connect_timeout = optional_duration(file.connect_timeout.as_ref(), "connect_timeout")?
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let grace_period = match overrides.grace_period {
            Some(grace) => grace,
            None => optional_interval(file.grace_period.as_ref(), "grace_period")?
                .unwrap_or(DEFAULT_GRACE_PERIOD),
        };

        let traffic_type = file
            .traffic_type
            .clone()
            .unwrap_or_else(|| DEFAULT_TRAFFIC_TYPE.to_owned());

        let mut headers = file
            .headers
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect::<Vec<_>>();
        headers.extend(overrides.headers.iter().cloned());
        validate_headers(&headers)?;

        let vars = resolve_vars(file.vars.clone().unwrap_or_default())?;

        let endpoint_configs = file.endpoints.unwrap_or_default();
        let mut names = BTreeSet::new();
        let mut endpoints = Vec::with_capacity(endpoint_configs.len());
        for (index, endpoint) in endpoint_configs.into_iter().enumerate() {
            let entry = Endpoint::from_config(index, endpoint)?;
            if !names.insert(entry.name().to_owned()) {
                return Err(AppError::config(ConfigError::DuplicateEndpoint {
                    name: entry.name().to_owned(),
                }));
            }
            validate_headers(entry.headers())?;
            endpoints.push(entry);
        }
        let catalog = EndpointCatalog::new(endpoints)?;

        Ok(Self {
            base_url,
            rate,
            concurrency,
            duration,
            summary_interval,
            request_timeout,
            connect_timeout,
            grace_period,
            traffic_type,
            headers,
            vars,
            seed: overrides.seed.or(file.seed),
            catalog,
        })
    }
}

fn optional_duration(
    value: Option<&DurationValue>,
    field: &'static str,
) -> AppResult<Option<Duration>> {
    value
        .map(|value| {
            value
                .to_duration()
                .map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
        })
        .transpose()
}

fn optional_interval(
    value: Option<&DurationValue>,
    field: &'static str,
) -> AppResult<Option<Duration>> {
    value
        .map(|value| {
            value
                .to_interval()
                .map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
        })
        .transpose()
}

/// Accepts `host:port` as well as full URLs; the result never ends with '/'.
pub(crate) fn normalize_base_url(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else if trimmed.contains("://") {
        return Err(AppError::config(ConfigError::UnsupportedScheme {
            url: trimmed.to_owned(),
        }));
    } else {
        format!("http://{}", trimmed)
    };
    let parsed = Url::parse(&with_scheme).map_err(|err| {
        AppError::config(ConfigError::InvalidBaseUrl {
            url: trimmed.to_owned(),
            source: err,
        })
    })?;
    if parsed.host_str().is_none() {
        return Err(AppError::config(ConfigError::InvalidBaseUrl {
            url: trimmed.to_owned(),
            source: url::ParseError::EmptyHost,
        }));
    }
    Ok(with_scheme.trim_end_matches('/').to_owned())
}

fn validate_headers(headers: &[(String, String)]) -> AppResult<()> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            AppError::config(ConfigError::InvalidHeader {
                name: name.clone(),
                source: ValidationError::InvalidHeaderName {
                    header: name.clone(),
                    source: err,
                },
            })
        })?;
        HeaderValue::from_str(value).map_err(|err| {
            AppError::config(ConfigError::InvalidHeader {
                name: name.clone(),
                source: ValidationError::InvalidHeaderValue {
                    header: name.clone(),
                    source: err,
                },
            })
        })?;
    }
    Ok(())
}

fn resolve_vars(pools: BTreeMap<String, Vec<Value>>) -> AppResult<TemplateVars> {
    for (name, values) in &pools {
        if values.is_empty() {
            return Err(AppError::config(ConfigError::EmptyVarPool { name: name.clone() }));
        }
        if values
            .iter()
            .any(|value| value.is_null() || value.is_array() || value.is_object())
        {
            return Err(AppError::config(ConfigError::InvalidVarValue { name: name.clone() }));
        }
    }
    Ok(TemplateVars::new(pools))
}
