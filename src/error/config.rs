use std::path::PathBuf;

use thiserror::Error;

use super::ValidationError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse YAML config '{path}': {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .yaml, .yml, .json or .toml.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have a .yaml, .yml, .json or .toml extension.")]
    MissingExtension,
    #[error("Config is missing required field '{field}'.")]
    MissingField { field: &'static str },
    #[error("Invalid base_url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("base_url '{url}' must use http or https.")]
    UnsupportedScheme { url: String },
    #[error("Config rate must be a positive finite number, got {value}.")]
    RateMustBePositive { value: f64 },
    #[error("Config concurrency must be >= 1.")]
    ConcurrencyMustBePositive,
    #[error("Config '{field}' is invalid: {source}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("Endpoint list must contain at least one endpoint.")]
    EmptyCatalog,
    #[error("Endpoint '{name}' weight must be a positive finite number, got {weight}.")]
    InvalidWeight { name: String, weight: f64 },
    #[error("Endpoint weights could not be normalized: {reason}")]
    InvalidWeights { reason: String },
    #[error("Endpoint '{name}' error_rate must be within 0..=1, got {rate}.")]
    InvalidErrorRate { name: String, rate: f64 },
    #[error("Endpoint '{name}' path '{path}' must start with '/'.")]
    InvalidPath { name: String, path: String },
    #[error("Endpoint '{name}' lists no error variants but may inject errors into its payload.")]
    NoErrorVariants { name: String },
    #[error("Duplicate endpoint name '{name}'.")]
    DuplicateEndpoint { name: String },
    #[error("Invalid header '{name}': {source}")]
    InvalidHeader {
        name: String,
        #[source]
        source: ValidationError,
    },
    #[error("Template variable '{name}' must list at least one value.")]
    EmptyVarPool { name: String },
    #[error("Template variable '{name}' may only hold strings, numbers or booleans.")]
    InvalidVarValue { name: String },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
