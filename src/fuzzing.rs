//! Thin wrappers exposing internal parsers to the fuzz targets.
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::args::parse_header;
use crate::config::{ConfigOverrides, TrafficConfig, load_config_file, parse_duration_value};
use crate::error::{AppError, AppResult};

/// Parses a header string in `Key: Value` format.
///
/// # Errors
///
/// Returns an error when the header is malformed.
pub fn parse_header_input(input: &str) -> AppResult<(String, String)> {
    parse_header(input).map_err(AppError::from)
}

/// Parses a duration value from config (e.g. `10s`, `500ms`, `5m`).
///
/// # Errors
///
/// Returns an error when the duration is invalid.
pub fn parse_duration_value_input(input: &str) -> AppResult<Duration> {
    parse_duration_value(input).map_err(AppError::from)
}

/// Loads and fully resolves a config file.
///
/// # Errors
///
/// Returns an error when the file cannot be read, parsed or validated.
pub fn load_config_file_input(path: &Path) -> AppResult<TrafficConfig> {
    let file = load_config_file(path)?;
    TrafficConfig::resolve(file, &ConfigOverrides::default())
}

#[must_use]
pub fn render_template_input(input: &str, vars: &BTreeMap<String, String>) -> String {
    let vars = vars
        .iter()
        .map(|(name, value)| (name.clone(), serde_json::Value::from(value.as_str())))
        .collect();
    crate::catalog::render_template(input, &vars)
}
