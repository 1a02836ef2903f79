use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::error::{AppError, AppResult};
use crate::metrics::ExceptionKind;
use crate::shutdown::shutdown_channel;
use crate::test_support::{MockBehavior, MockTransport, run_paused, traffic_config};

#[test]
fn in_flight_requests_finish_within_grace() -> AppResult<()> {
    run_paused(async {
        let mut config = traffic_config(10.0, 10)?;
        config.duration = Some(Duration::from_millis(250));
        config.grace_period = Duration::from_secs(1);
        let transport = Arc::new(MockTransport::new(
            MockBehavior::Delay(Duration::from_millis(500)),
            200,
        ));
        let (shutdown_tx, _) = shutdown_channel();

        let report = LifecycleController::new(config, transport)
            .run(&shutdown_tx)
            .await;

        if report.reason != StopReason::DurationElapsed {
            return Err(AppError::validation(format!("Unexpected reason {}", report.reason)));
        }
        if report.stats.started != 3 || report.drained != 3 || report.cancelled != 0 {
            return Err(AppError::validation(format!(
                "Unexpected drain: started {}, drained {}, cancelled {}",
                report.stats.started, report.drained, report.cancelled
            )));
        }
        if report.final_snapshot.status_counts.get(&200) != Some(&3) {
            return Err(AppError::validation("Expected three recorded responses"));
        }
        Ok(())
    })
}

#[test]
fn requests_past_grace_are_cancelled() -> AppResult<()> {
    run_paused(async {
        let mut config = traffic_config(10.0, 10)?;
        config.duration = Some(Duration::from_millis(150));
        config.grace_period = Duration::from_secs(1);
        config.request_timeout = Duration::from_secs(30);
        let transport = Arc::new(MockTransport::new(MockBehavior::Hang, 200));
        let (shutdown_tx, _) = shutdown_channel();

        let report = LifecycleController::new(config, transport)
            .run(&shutdown_tx)
            .await;

        let cancelled = report
            .final_snapshot
            .exception_counts
            .get(&ExceptionKind::Cancelled)
            .copied()
            .unwrap_or(0);
        if report.stats.started != 2 || cancelled != 2 || report.cancelled != 2 {
            return Err(AppError::validation(format!(
                "Expected 2 cancelled requests, got {} recorded of {} started",
                cancelled, report.stats.started
            )));
        }
        if report.totals.requests != report.stats.started {
            return Err(AppError::validation("Cancelled requests must be counted"));
        }
        Ok(())
    })
}

#[test]
fn signal_moves_run_to_stopped() -> AppResult<()> {
    run_paused(async {
        let config = traffic_config(10.0, 10)?;
        let transport = Arc::new(MockTransport::new(MockBehavior::Immediate, 204));
        let (shutdown_tx, _) = shutdown_channel();
        let signal_tx = shutdown_tx.clone();
        let signal = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            drop(signal_tx.send(StopReason::Signal));
        });

        let report = LifecycleController::new(config, transport)
            .run(&shutdown_tx)
            .await;
        signal.await?;

        if report.reason != StopReason::Signal {
            return Err(AppError::validation(format!("Unexpected reason {}", report.reason)));
        }
        if report.totals.requests == 0 || report.totals.requests != report.stats.started {
            return Err(AppError::validation("Expected every request to be recorded"));
        }
        Ok(())
    })
}

#[test]
fn summaries_follow_their_own_interval() -> AppResult<()> {
    run_paused(async {
        let mut config = traffic_config(10.0, 10)?;
        config.duration = Some(Duration::from_secs(25));
        config.summary_interval = Duration::from_secs(10);
        let transport = Arc::new(MockTransport::new(MockBehavior::Immediate, 200));
        let (shutdown_tx, _) = shutdown_channel();

        let report = LifecycleController::new(config, transport)
            .run(&shutdown_tx)
            .await;

        if report.summaries != 2 {
            return Err(AppError::validation(format!(
                "Expected 2 periodic summaries, got {}",
                report.summaries
            )));
        }
        if report.final_snapshot.total >= report.totals.requests {
            return Err(AppError::validation(
                "Final window should only hold requests since the last summary",
            ));
        }
        Ok(())
    })
}

#[test]
fn lifecycle_state_names() -> AppResult<()> {
    let names = [
        LifecycleState::Running.to_string(),
        LifecycleState::Draining.to_string(),
        LifecycleState::Stopped.to_string(),
    ];
    if names != ["RUNNING", "DRAINING", "STOPPED"] {
        return Err(AppError::validation(format!("Unexpected names {:?}", names)));
    }
    Ok(())
}

#[test]
fn failed_summary_task_is_not_fatal() -> AppResult<()> {
    run_paused(async {
        let stuck = tokio::spawn(std::future::pending::<u64>());
        stuck.abort();
        if join_reporter(Some(stuck)).await != 0 {
            return Err(AppError::validation("Aborted summary task reported summaries"));
        }

        let finished = tokio::spawn(async { 4_u64 });
        if join_reporter(Some(finished)).await != 4 {
            return Err(AppError::validation("Expected the summary count to pass through"));
        }
        if join_reporter(None).await != 0 {
            return Err(AppError::validation("Disabled summaries must count zero"));
        }
        Ok(())
    })
}
