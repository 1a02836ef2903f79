use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info, warn};

use crate::args::TrafficArgs;
use crate::config::{TrafficConfig, resolve_config};
use crate::error::AppResult;
use crate::http::HttpTransport;
use crate::lifecycle::LifecycleController;
use crate::shutdown::shutdown_channel;
use crate::shutdown_handlers::setup_signal_shutdown_handler;

pub(crate) fn run() -> AppResult<()> {
    let args = TrafficArgs::parse();

    crate::logger::init_logging(args.verbose, args.no_color);

    let config = resolve_config(&args)?;
    log_config(&config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(config))
}

async fn run_async(config: TrafficConfig) -> AppResult<()> {
    let transport = HttpTransport::new(&config)?;
    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let report = LifecycleController::new(config, Arc::new(transport))
        .run(&shutdown_tx)
        .await;

    if let Err(err) = signal_handle.await {
        warn!("Signal handler task failed: {}", err);
    }
    info!(
        reason = %report.reason,
        requests = report.totals.requests,
        "Exiting"
    );
    Ok(())
}

fn log_config(config: &TrafficConfig) {
    info!(
        base_url = %config.base_url,
        rate = config.rate,
        concurrency = config.concurrency,
        duration = ?config.duration,
        summary_interval = ?config.summary_interval,
        request_timeout = ?config.request_timeout,
        grace_period = ?config.grace_period,
        traffic_type = %config.traffic_type,
        endpoints = config.catalog.len(),
        seed = ?config.seed,
        "Resolved configuration"
    );
    for endpoint in config.catalog.iter() {
        debug!(
            name = endpoint.name(),
            method = %endpoint.method(),
            path = endpoint.path(),
            weight = endpoint.weight(),
            classification = %endpoint.classification(),
            error_rate = endpoint.error_rate(),
            "Endpoint"
        );
    }
}
