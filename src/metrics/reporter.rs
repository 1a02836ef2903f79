use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::info;

use crate::shutdown::ShutdownSender;

use super::aggregator::MetricsAggregator;
use super::types::MetricsSnapshot;

/// Starts the periodic summary task. It runs on its own timer, independent
/// of dispatch, and exits on the first shutdown broadcast. Returns `None`
/// when `interval` is zero. The handle resolves to the number of summaries
/// emitted.
pub fn spawn_summary_reporter(
    aggregator: MetricsAggregator,
    interval: Duration,
    run_start: Instant,
    shutdown_tx: &ShutdownSender,
) -> Option<JoinHandle<u64>> {
    if interval.is_zero() {
        return None;
    }
    let mut shutdown_rx = shutdown_tx.subscribe();
    Some(tokio::spawn(async move {
        let first_tick = Instant::now()
            .checked_add(interval)
            .unwrap_or_else(Instant::now);
        let mut ticker = interval_at(first_tick, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut emitted: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = ticker.tick() => {
                    let snapshot = aggregator.flush();
                    log_summary("SUMMARY", run_start.elapsed(), &snapshot);
                    emitted = emitted.saturating_add(1);
                }
            }
        }
        emitted
    }))
}

pub fn log_summary(label: &str, elapsed: Duration, snapshot: &MetricsSnapshot) {
    info!(
        total = snapshot.total,
        exceptions = snapshot.exception_total(),
        injected = snapshot.injected,
        p50_ms = snapshot.latency.p50_ms,
        p99_ms = snapshot.latency.p99_ms,
        "{}",
        summary_line(label, elapsed, snapshot)
    );
}

/// One-line human readable rendering of a window.
#[must_use]
pub fn summary_line(label: &str, elapsed: Duration, snapshot: &MetricsSnapshot) -> String {
    let mut parts = vec![format!(
        "{} elapsed={:.1?} window={:.1?} ({} -> {})",
        label,
        elapsed,
        snapshot.window,
        snapshot.window_start.format("%H:%M:%S"),
        snapshot.window_end.format("%H:%M:%S"),
    )];
    parts.push(format!("total={}", snapshot.total));
    parts.push(format!(
        "status {}",
        join_counts(
            snapshot
                .status_counts
                .iter()
                .map(|(status, count)| (status.to_string(), *count))
        )
    ));
    parts.push(format!(
        "exceptions {}",
        join_counts(
            snapshot
                .exception_counts
                .iter()
                .map(|(kind, count)| (kind.as_str().to_owned(), *count))
        )
    ));
    parts.push(format!(
        "good={} bad={} injected={}",
        snapshot.good, snapshot.bad, snapshot.injected
    ));
    parts.push(format!(
        "latency p50={}ms p90={}ms p99={}ms max={}ms",
        snapshot.latency.p50_ms,
        snapshot.latency.p90_ms,
        snapshot.latency.p99_ms,
        snapshot.latency.max_ms
    ));
    if !snapshot.endpoint_counts.is_empty() {
        parts.push(format!(
            "endpoints {}",
            join_counts(
                snapshot
                    .endpoint_counts
                    .iter()
                    .map(|(name, count)| (name.to_string(), *count))
            )
        ));
    }
    parts.join(" | ")
}

fn join_counts<I>(counts: I) -> String
where
    I: Iterator<Item = (String, u64)>,
{
    let rendered: Vec<String> = counts
        .map(|(key, count)| format!("{}={}", key, count))
        .collect();
    if rendered.is_empty() {
        "none".to_owned()
    } else {
        rendered.join(" ")
    }
}
