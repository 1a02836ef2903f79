use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::warn;

use crate::catalog::Classification;

use super::LatencyHistogram;
use super::types::{
    ExceptionKind, LatencySummary, MetricsSnapshot, MetricsTotals, RequestOutcome, StatusClass,
};

/// Shared window counters. Cloning yields another handle on the same
/// window.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    inner: Arc<Mutex<AggregatorState>>,
}

#[derive(Debug)]
struct AggregatorState {
    window_start: DateTime<Utc>,
    window_started: Instant,
    total: u64,
    status_counts: BTreeMap<u16, u64>,
    exception_counts: BTreeMap<ExceptionKind, u64>,
    endpoint_counts: BTreeMap<Arc<str>, u64>,
    good: u64,
    bad: u64,
    injected: u64,
    histogram: Option<LatencyHistogram>,
    totals: MetricsTotals,
}

impl AggregatorState {
    fn new() -> Self {
        let histogram = match LatencyHistogram::new() {
            Ok(histogram) => Some(histogram),
            Err(err) => {
                warn!("Failed to initialize latency histogram: {}", err);
                None
            }
        };
        Self {
            window_start: Utc::now(),
            window_started: Instant::now(),
            total: 0,
            status_counts: BTreeMap::new(),
            exception_counts: BTreeMap::new(),
            endpoint_counts: BTreeMap::new(),
            good: 0,
            bad: 0,
            injected: 0,
            histogram,
            totals: MetricsTotals::default(),
        }
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(AggregatorState::new())),
        }
    }

    /// Adds one outcome to the current window and the running totals.
    pub fn record(&self, outcome: RequestOutcome) {
        let latency_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX);
        let mut state = self.lock();

        state.total = state.total.saturating_add(1);
        bump(state.endpoint_counts.entry(outcome.endpoint).or_insert(0));
        match outcome.classification {
            Classification::Good => state.good = state.good.saturating_add(1),
            Classification::Bad => state.bad = state.bad.saturating_add(1),
        }
        if outcome.injected {
            state.injected = state.injected.saturating_add(1);
            state.totals.injected = state.totals.injected.saturating_add(1);
        }
        if let Some(status) = outcome.status {
            bump(state.status_counts.entry(status).or_insert(0));
            bump(
                state
                    .totals
                    .by_class
                    .entry(StatusClass::of(status))
                    .or_insert(0),
            );
        }
        if let Some(kind) = outcome.exception {
            bump(state.exception_counts.entry(kind).or_insert(0));
            state.totals.exceptions = state.totals.exceptions.saturating_add(1);
        }
        state.totals.requests = state.totals.requests.saturating_add(1);
        if let Some(histogram) = state.histogram.as_mut() {
            histogram.record(latency_ms);
        }
    }

    /// Returns everything recorded since the previous flush and starts a new
    /// window.
    pub fn flush(&self) -> MetricsSnapshot {
        let now = Utc::now();
        let now_instant = Instant::now();
        let mut state = self.lock();

        let latency = state.histogram.as_ref().map_or_else(LatencySummary::default, |histogram| {
            let (p50_ms, p90_ms, p99_ms) = histogram.percentiles();
            LatencySummary {
                p50_ms,
                p90_ms,
                p99_ms,
                max_ms: histogram.max(),
            }
        });
        let snapshot = MetricsSnapshot {
            window_start: state.window_start,
            window_end: now,
            window: now_instant.saturating_duration_since(state.window_started),
            total: state.total,
            status_counts: std::mem::take(&mut state.status_counts),
            exception_counts: std::mem::take(&mut state.exception_counts),
            endpoint_counts: std::mem::take(&mut state.endpoint_counts),
            good: state.good,
            bad: state.bad,
            injected: state.injected,
            latency,
        };

        state.window_start = now;
        state.window_started = now_instant;
        state.total = 0;
        state.good = 0;
        state.bad = 0;
        state.injected = 0;
        if let Some(histogram) = state.histogram.as_mut() {
            histogram.reset();
        }
        snapshot
    }

    #[must_use]
    pub fn totals(&self) -> MetricsTotals {
        self.lock().totals.clone()
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

const fn bump(counter: &mut u64) {
    *counter = counter.saturating_add(1);
}
