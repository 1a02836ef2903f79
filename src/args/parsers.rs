use std::time::Duration;

use super::types::{PositiveRate, PositiveUsize};
use crate::config::{parse_duration_value, parse_interval_value};
use crate::error::{AppError, AppResult, ValidationError};

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once(':') {
        Some((key, value)) => Ok((key.trim().to_owned(), value.trim().to_owned())),
        None => Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(super) fn parse_positive_rate(s: &str) -> AppResult<PositiveRate> {
    s.parse::<PositiveRate>().map_err(AppError::from)
}

pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s).map_err(AppError::from)
}

pub(super) fn parse_interval_arg(s: &str) -> AppResult<Duration> {
    parse_interval_value(s).map_err(AppError::from)
}
