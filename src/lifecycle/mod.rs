//! Run lifecycle: `Running -> Draining -> Stopped`.
#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::TrafficConfig;
use crate::http::{DispatchStats, Dispatcher, Transport};
use crate::metrics::{
    MetricsAggregator, MetricsSnapshot, MetricsTotals, StatusClass, log_summary,
    spawn_summary_reporter,
};
use crate::shutdown::{ShutdownSender, StopReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Draining,
    Stopped,
}

impl LifecycleState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Running => "RUNNING",
            LifecycleState::Draining => "DRAINING",
            LifecycleState::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// What a finished run looked like.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub reason: StopReason,
    pub final_snapshot: MetricsSnapshot,
    pub stats: DispatchStats,
    pub totals: MetricsTotals,
    /// Requests that finished during the grace period.
    pub drained: usize,
    /// Requests aborted when the grace period ran out.
    pub cancelled: usize,
    pub summaries: u64,
}

pub struct LifecycleController {
    config: TrafficConfig,
    transport: Arc<dyn Transport>,
    aggregator: MetricsAggregator,
    state: LifecycleState,
}

impl LifecycleController {
    #[must_use]
    pub fn new(config: TrafficConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            aggregator: MetricsAggregator::new(),
            state: LifecycleState::Running,
        }
    }


    /// Runs until a stop is broadcast on `shutdown_tx` or the configured
    /// duration elapses, then drains in-flight requests and logs the final
    /// summary. A failed summary task is logged and never skips the drain.
    pub async fn run(mut self, shutdown_tx: &ShutdownSender) -> RunReport {
        let run_start = Instant::now();
        let deadline = self
            .config
            .duration
            .and_then(|duration| run_start.checked_add(duration));
        let mut shutdown_rx = shutdown_tx.subscribe();

        info!(state = %self.state, "Lifecycle started");
        let reporter = spawn_summary_reporter(
            self.aggregator.clone(),
            self.config.summary_interval,
            run_start,
            shutdown_tx,
        );

        let dispatcher = Dispatcher::new(
            &self.config,
            Arc::clone(&self.transport),
            self.aggregator.clone(),
        );
        let plan = dispatcher.plan();
        info!(
            period = ?plan.period,
            per_tick = plan.per_tick,
            fraction_ppm = plan.fraction,
            "Dispatching requests"
        );
        let (reason, in_flight) = dispatcher.run(&mut shutdown_rx, deadline).await;

        self.transition(LifecycleState::Draining);
        info!(
            reason = %reason,
            in_flight = in_flight.len(),
            grace = ?self.config.grace_period,
            "Stopping dispatch"
        );
        // Wakes the reporter and signal handler when the stop came from the deadline.
        drop(shutdown_tx.send(reason));

        let summaries = join_reporter(reporter).await;
        let drain = in_flight.drain(self.config.grace_period).await;

        let final_snapshot = self.aggregator.flush();
        log_summary("FINAL", run_start.elapsed(), &final_snapshot);
        let totals = self.aggregator.totals();
        self.transition(LifecycleState::Stopped);
        if drain.cancelled > 0 {
            warn!(cancelled = drain.cancelled, "Requests cancelled at shutdown");
        }
        info!(
            reason = %reason,
            requests = totals.requests,
            success = totals.class(StatusClass::Success),
            client_errors = totals.class(StatusClass::ClientError),
            server_errors = totals.class(StatusClass::ServerError),
            exceptions = totals.exceptions,
            injected = totals.injected,
            throttled = drain.stats.throttled,
            build_failures = drain.stats.build_failures,
            "Traffic generation stopped"
        );

        RunReport {
            reason,
            final_snapshot,
            stats: drain.stats,
            totals,
            drained: drain.completed,
            cancelled: drain.cancelled,
            summaries,
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        if self.state != next {
            info!(from = %self.state, to = %next, "Lifecycle transition");
        }
        self.state = next;
    }
}

/// Waits for the summary task; returns how many periodic summaries it logged.
async fn join_reporter(reporter: Option<JoinHandle<u64>>) -> u64 {
    let Some(handle) = reporter else {
        return 0;
    };
    match handle.await {
        Ok(emitted) => emitted,
        Err(err) => {
            warn!("Summary task failed: {}", err);
            0
        }
    }
}
