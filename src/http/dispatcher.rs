use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tracing::{debug, warn};

use crate::catalog::{Classification, RequestContext};
use crate::config::TrafficConfig;
use crate::metrics::{ExceptionKind, MetricsAggregator, RequestOutcome};
use crate::shutdown::{ShutdownReceiver, StopReason};

use super::Transport;

/// Shortest tick period; higher rates start several requests per tick.
const MIN_TICK: Duration = Duration::from_millis(1);
const TICKS_PER_SEC_AT_MIN: f64 = 1000.0;
/// Fractional starts are tracked in millionths of a request.
const FRACTION_SCALE: u64 = 1_000_000;

/// Tick period and starts per tick for a requests/second rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub period: Duration,
    pub per_tick: usize,
    /// Fractional part of the starts per tick, in millionths. Carried across
    /// ticks so the long-run rate matches the configured one.
    pub fraction: u64,
}

impl TickPlan {
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "rate is a validated positive finite requests/second value"
    )]
    pub fn from_rate(rate: f64) -> Self {
        let period = Duration::try_from_secs_f64(1.0 / rate).unwrap_or(Duration::MAX);
        if period >= MIN_TICK {
            return Self {
                period,
                per_tick: 1,
                fraction: 0,
            };
        }
        let scaled = (rate / TICKS_PER_SEC_AT_MIN * 1_000_000.0).round() as u64;
        let (whole, fraction) = div_mod_u64(scaled, FRACTION_SCALE);
        Self {
            period: MIN_TICK,
            per_tick: usize::try_from(whole).unwrap_or(usize::MAX),
            fraction,
        }
    }

    /// Starts due on the next tick, adding this tick's fraction to
    /// `remainder` and releasing a whole start once it reaches one.
    #[must_use]
    pub fn next_starts(&self, remainder: &mut u64) -> usize {
        let (carry, rest) = div_mod_u64(remainder.saturating_add(self.fraction), FRACTION_SCALE);
        *remainder = rest;
        self.per_tick
            .saturating_add(usize::try_from(carry).unwrap_or(usize::MAX))
    }
}

fn div_mod_u64(value: u64, divisor: u64) -> (u64, u64) {
    (
        value.checked_div(divisor).unwrap_or(0),
        value.checked_rem(divisor).unwrap_or(0),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub ticks: u64,
    pub started: u64,
    /// Starts skipped because the concurrency ceiling was reached.
    pub throttled: u64,
    pub build_failures: u64,
    pub peak_in_flight: usize,
}

/// Starts requests at the configured rate until a stop is broadcast or the
/// deadline passes.
pub struct Dispatcher<'cfg> {
    config: &'cfg TrafficConfig,
    transport: Arc<dyn Transport>,
    aggregator: MetricsAggregator,
    permits: Arc<Semaphore>,
    concurrency: usize,
    plan: TickPlan,
    remainder: u64,
    rng: StdRng,
    next_seq: u64,
    stats: DispatchStats,
}

impl<'cfg> Dispatcher<'cfg> {
    #[must_use]
    pub fn new(
        config: &'cfg TrafficConfig,
        transport: Arc<dyn Transport>,
        aggregator: MetricsAggregator,
    ) -> Self {
        let concurrency = config.concurrency.clamp(1, Semaphore::MAX_PERMITS);
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            config,
            transport,
            aggregator,
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            plan: TickPlan::from_rate(config.rate),
            remainder: 0,
            rng,
            next_seq: 0,
            stats: DispatchStats::default(),
        }
    }

    #[must_use]
    pub const fn plan(&self) -> TickPlan {
        self.plan
    }

    /// Runs the dispatch loop. Pending ticks are dropped as soon as it
    /// returns; started requests keep running inside the returned
    /// [`InFlight`].
    pub async fn run(
        mut self,
        shutdown_rx: &mut ShutdownReceiver,
        deadline: Option<Instant>,
    ) -> (StopReason, InFlight) {
        let mut ticker = interval(self.plan.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tasks = JoinSet::new();
        let deadline_reached = async {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_reached);

        let reason = loop {
            tokio::select! {
                biased;
                received = shutdown_rx.recv() => {
                    break received.unwrap_or(StopReason::Signal);
                }
                () = &mut deadline_reached => break StopReason::DurationElapsed,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_join_failure(&joined);
                }
                _ = ticker.tick() => self.on_tick(&mut tasks),
            }
        };

        debug!(
            reason = %reason,
            in_flight = tasks.len(),
            "Dispatch loop stopped"
        );
        (
            reason,
            InFlight {
                tasks,
                stats: self.stats,
            },
        )
    }

    fn on_tick(&mut self, tasks: &mut JoinSet<()>) {
        self.stats.ticks = self.stats.ticks.saturating_add(1);
        let due = self.plan.next_starts(&mut self.remainder);
        for attempt in 0..due {
            let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
                let skipped = due.saturating_sub(attempt);
                self.stats.throttled = self
                    .stats
                    .throttled
                    .saturating_add(u64::try_from(skipped).unwrap_or(u64::MAX));
                debug!(skipped, "Concurrency ceiling reached, skipping starts");
                break;
            };
            let in_flight = self
                .concurrency
                .saturating_sub(self.permits.available_permits());
            self.stats.peak_in_flight = self.stats.peak_in_flight.max(in_flight);
            self.start_request(permit, tasks);
        }
    }

    fn start_request(&mut self, permit: OwnedSemaphorePermit, tasks: &mut JoinSet<()>) {
        let config = self.config;
        let seq = self.next_seq;
        self.next_seq = seq.saturating_add(1);

        let endpoint = config.catalog.select(&mut self.rng);
        let injected = endpoint.should_inject(&mut self.rng);
        let context = RequestContext {
            base_url: &config.base_url,
            headers: &config.headers,
            vars: &config.vars,
        };
        let request = match endpoint.prepare(&context, seq, injected, &mut self.rng) {
            Ok(request) => request,
            Err(err) => {
                warn!(endpoint = endpoint.name(), "Failed to build request: {}", err);
                self.stats.build_failures = self.stats.build_failures.saturating_add(1);
                self.aggregator.record(RequestOutcome::exception(
                    endpoint.name_tag(),
                    endpoint.classification(),
                    injected,
                    ExceptionKind::Build,
                    Duration::ZERO,
                ));
                return;
            }
        };

        debug!(
            seq,
            endpoint = endpoint.name(),
            method = %request.method,
            url = %request.url,
            injected,
            variant = request.variant.map(|variant| variant.as_str()),
            "Dispatching request"
        );

        let pending = PendingOutcome::new(
            self.aggregator.clone(),
            endpoint.name_tag(),
            endpoint.classification(),
            injected,
        );
        let transport = Arc::clone(&self.transport);
        let request_timeout = config.request_timeout;
        tasks.spawn(async move {
            let _permit = permit;
            let result = match tokio::time::timeout(request_timeout, transport.send(request)).await
            {
                Ok(Ok(status)) => Ok(status),
                Ok(Err(err)) => {
                    debug!("Request failed: {}", err);
                    Err(ExceptionKind::from(&err))
                }
                Err(_) => Err(ExceptionKind::Timeout),
            };
            pending.complete(result);
        });
        self.stats.started = self.stats.started.saturating_add(1);
    }
}

/// Requests still running when dispatch stopped.
pub struct InFlight {
    tasks: JoinSet<()>,
    stats: DispatchStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub stats: DispatchStats,
    /// Requests that finished during the grace period.
    pub completed: usize,
    /// Requests aborted when the grace period ran out.
    pub cancelled: usize,
}

impl InFlight {
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Lets running requests finish for up to `grace`, then aborts the rest.
    /// Aborted requests are recorded as cancelled.
    pub async fn drain(mut self, grace: Duration) -> DrainReport {
        let mut completed: usize = 0;
        let finished = tokio::time::timeout(grace, async {
            while let Some(joined) = self.tasks.join_next().await {
                log_join_failure(&joined);
                completed = completed.saturating_add(1);
            }
        })
        .await;

        let cancelled = self.tasks.len();
        if finished.is_err() && cancelled > 0 {
            warn!(cancelled, "Grace period elapsed, aborting in-flight requests");
            self.tasks.abort_all();
            while let Some(joined) = self.tasks.join_next().await {
                if let Err(err) = joined
                    && !err.is_cancelled()
                {
                    warn!("Request task failed: {}", err);
                }
            }
        }

        DrainReport {
            stats: self.stats,
            completed,
            cancelled,
        }
    }
}

fn log_join_failure(joined: &Result<(), JoinError>) {
    if let Err(err) = joined {
        warn!("Request task failed: {}", err);
    }
}

/// Records the outcome exactly once. A task dropped before completing
/// (aborted or panicked) records an exception instead.
struct PendingOutcome {
    aggregator: MetricsAggregator,
    endpoint: Arc<str>,
    classification: Classification,
    injected: bool,
    started: Instant,
    done: bool,
}

impl PendingOutcome {
    fn new(
        aggregator: MetricsAggregator,
        endpoint: Arc<str>,
        classification: Classification,
        injected: bool,
    ) -> Self {
        Self {
            aggregator,
            endpoint,
            classification,
            injected,
            started: Instant::now(),
            done: false,
        }
    }

    fn complete(mut self, result: Result<u16, ExceptionKind>) {
        self.done = true;
        let elapsed = self.started.elapsed();
        let endpoint = Arc::clone(&self.endpoint);
        let outcome = match result {
            Ok(status) => {
                debug!(endpoint = %endpoint, status, ?elapsed, "Request completed");
                RequestOutcome::response(endpoint, self.classification, self.injected, status, elapsed)
            }
            Err(kind) => {
                debug!(endpoint = %endpoint, exception = %kind, ?elapsed, "Request failed");
                RequestOutcome::exception(endpoint, self.classification, self.injected, kind, elapsed)
            }
        };
        self.aggregator.record(outcome);
    }
}

impl Drop for PendingOutcome {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let kind = if std::thread::panicking() {
            ExceptionKind::Other
        } else {
            ExceptionKind::Cancelled
        };
        self.aggregator.record(RequestOutcome::exception(
            Arc::clone(&self.endpoint),
            self.classification,
            self.injected,
            kind,
            self.started.elapsed(),
        ));
    }
}
