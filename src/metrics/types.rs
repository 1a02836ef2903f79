use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::catalog::Classification;
use crate::error::TransportError;

/// Why a request produced no HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExceptionKind {
    Timeout,
    Connection,
    /// The request could not be constructed; it was never sent.
    Build,
    Other,
    /// Aborted at the end of the grace period.
    Cancelled,
}

impl ExceptionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ExceptionKind::Timeout => "timeout",
            ExceptionKind::Connection => "connection",
            ExceptionKind::Build => "build",
            ExceptionKind::Other => "other",
            ExceptionKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<&TransportError> for ExceptionKind {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::Timeout => ExceptionKind::Timeout,
            TransportError::Connection { .. } => ExceptionKind::Connection,
            TransportError::Other { .. } => ExceptionKind::Other,
        }
    }
}

/// Result of one request, handed to the aggregator as soon as it completes.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub endpoint: Arc<str>,
    pub classification: Classification,
    pub injected: bool,
    pub status: Option<u16>,
    pub elapsed: Duration,
    pub exception: Option<ExceptionKind>,
}

impl RequestOutcome {
    #[must_use]
    pub const fn response(
        endpoint: Arc<str>,
        classification: Classification,
        injected: bool,
        status: u16,
        elapsed: Duration,
    ) -> Self {
        Self {
            endpoint,
            classification,
            injected,
            status: Some(status),
            elapsed,
            exception: None,
        }
    }

    #[must_use]
    pub const fn exception(
        endpoint: Arc<str>,
        classification: Classification,
        injected: bool,
        kind: ExceptionKind,
        elapsed: Duration,
    ) -> Self {
        Self {
            endpoint,
            classification,
            injected,
            status: None,
            elapsed,
            exception: Some(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusClass {
    Informational,
    Success,
    Redirect,
    ClientError,
    ServerError,
    Unknown,
}

impl StatusClass {
    #[must_use]
    pub const fn of(status: u16) -> Self {
        match status {
            100..=199 => StatusClass::Informational,
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirect,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusClass::Informational => "1xx",
            StatusClass::Success => "2xx",
            StatusClass::Redirect => "3xx",
            StatusClass::ClientError => "4xx",
            StatusClass::ServerError => "5xx",
            StatusClass::Unknown => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencySummary {
    pub p50_ms: u64,
    pub p90_ms: u64,
    pub p99_ms: u64,
    pub max_ms: u64,
}

/// Counts for one summary window.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub window: Duration,
    pub total: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub exception_counts: BTreeMap<ExceptionKind, u64>,
    pub endpoint_counts: BTreeMap<Arc<str>, u64>,
    pub good: u64,
    pub bad: u64,
    pub injected: u64,
    pub latency: LatencySummary,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn exception_total(&self) -> u64 {
        self.exception_counts
            .values()
            .fold(0_u64, |acc, count| acc.saturating_add(*count))
    }

    #[must_use]
    pub fn status_total(&self) -> u64 {
        self.status_counts
            .values()
            .fold(0_u64, |acc, count| acc.saturating_add(*count))
    }
}

/// Counters kept across windows for the final log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsTotals {
    pub requests: u64,
    pub by_class: BTreeMap<StatusClass, u64>,
    pub exceptions: u64,
    pub injected: u64,
}

impl MetricsTotals {
    #[must_use]
    pub fn class(&self, class: StatusClass) -> u64 {
        self.by_class.get(&class).copied().unwrap_or(0)
    }
}
