use std::fmt;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::args::HttpMethod;
use crate::config::types::EndpointConfig;
use crate::error::{AppError, AppResult, ConfigError, HttpError};
use crate::http::PreparedRequest;

use super::payload::{self, ErrorVariant};
use super::template::{TemplateVars, render_json, render_template};

/// Path segment appended when an endpoint has neither an error path nor a
/// payload to corrupt.
const INVALID_PATH_SEGMENT: &str = "__trafficgen_invalid__";

/// Whether an endpoint normally produces a success or a failure.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    #[default]
    Good,
    Bad,
}

impl Classification {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Classification::Good => "good",
            Classification::Bad => "bad",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Shared request-building inputs that do not vary per endpoint.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'ctx> {
    pub base_url: &'ctx str,
    pub headers: &'ctx [(String, String)],
    pub vars: &'ctx TemplateVars,
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    name: Arc<str>,
    method: HttpMethod,
    path: String,
    error_path: Option<String>,
    weight: f64,
    classification: Classification,
    payload: Option<Value>,
    error_rate: f64,
    error_variants: Vec<ErrorVariant>,
    headers: Vec<(String, String)>,
}

impl Endpoint {
    /// Validates one configured endpoint. `index` names endpoints that have
    /// no explicit name.
    ///
    /// # Errors
    ///
    /// Returns an error when the weight is not positive, the error rate lies
    /// outside 0..=1, a path does not start with '/', or the endpoint may
    /// corrupt a payload but lists no error variants.
    pub fn from_config(index: usize, config: EndpointConfig) -> Result<Self, ConfigError> {
        let name = config
            .name
            .unwrap_or_else(|| format!("endpoint_{}", index.saturating_add(1)));

        if !config.weight.is_finite() || config.weight <= 0.0 {
            return Err(ConfigError::InvalidWeight {
                name,
                weight: config.weight,
            });
        }

        let error_rate = config.error_rate.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(ConfigError::InvalidErrorRate {
                name,
                rate: error_rate,
            });
        }

        for path in std::iter::once(&config.path).chain(config.error_path.as_ref()) {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath {
                    name,
                    path: path.clone(),
                });
            }
        }

        if config.payload.is_some() && !config.method.has_body() {
            warn!(
                endpoint = %name,
                method = %config.method,
                "Payload configured on a method that usually carries no body"
            );
        }

        let may_inject = config.classification == Classification::Bad || error_rate > 0.0;
        let error_variants = config
            .error_variants
            .unwrap_or_else(|| ErrorVariant::ALL.to_vec());
        if may_inject && config.payload.is_some() && error_variants.is_empty() {
            return Err(ConfigError::NoErrorVariants { name });
        }

        Ok(Self {
            name: Arc::from(name),
            method: config.method,
            path: config.path,
            error_path: config.error_path,
            weight: config.weight,
            classification: config.classification,
            payload: config.payload,
            error_rate,
            error_variants,
            headers: config.headers.unwrap_or_default().into_iter().collect(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cheap shared handle on the name, used to tag outcomes.
    #[must_use]
    pub fn name_tag(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    #[must_use]
    pub const fn classification(&self) -> Classification {
        self.classification
    }

    #[must_use]
    pub const fn error_rate(&self) -> f64 {
        self.error_rate
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Bad endpoints always inject; good ones inject with `error_rate`.
    pub fn should_inject<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        match self.classification {
            Classification::Bad => true,
            Classification::Good => self.error_rate > 0.0 && rng.gen_bool(self.error_rate),
        }
    }

    /// Renders templates and builds the concrete request for sequence `seq`.
    ///
    /// # Errors
    ///
    /// Returns an error when the rendered URL does not parse or the payload
    /// cannot be serialized.
    pub fn prepare<R: Rng + ?Sized>(
        &self,
        context: &RequestContext<'_>,
        seq: u64,
        inject: bool,
        rng: &mut R,
    ) -> AppResult<PreparedRequest> {
        let vars = context.vars.sample(seq, rng);

        let path_template = if inject {
            self.error_path.as_deref().unwrap_or(&self.path)
        } else {
            &self.path
        };
        let mut path = render_template(path_template, &vars);
        if inject && self.error_path.is_none() && self.payload.is_none() {
            path = format!("{}/{}", path.trim_end_matches('/'), INVALID_PATH_SEGMENT);
        }

        let raw_url = format!("{}{}", context.base_url, path);
        let url = Url::parse(&raw_url).map_err(|err| {
            AppError::http(HttpError::InvalidUrl {
                url: raw_url,
                source: err,
            })
        })?;

        let mut variant = None;
        let body = match &self.payload {
            None => None,
            Some(template) => {
                let rendered = render_json(template, &vars);
                let chosen = if inject {
                    self.error_variants.choose(rng).copied()
                } else {
                    None
                };
                variant = chosen;
                Some(match chosen {
                    Some(chosen) => payload::corrupt(&rendered, chosen)?,
                    None => payload::encode_valid(&rendered)?,
                })
            }
        };

        let mut headers = Vec::with_capacity(
            context
                .headers
                .len()
                .saturating_add(self.headers.len())
                .saturating_add(1),
        );
        headers.extend(context.headers.iter().cloned());
        headers.extend(self.headers.iter().cloned());

        let body = body.map(|body| {
            let has_content_type = headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
            if !has_content_type || variant == Some(ErrorVariant::WrongContentType) {
                headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
                headers.push(("Content-Type".to_owned(), body.content_type.to_owned()));
            }
            body.bytes
        });

        Ok(PreparedRequest {
            method: self.method,
            url,
            headers,
            body,
            variant,
        })
    }
}
