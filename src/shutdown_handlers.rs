use tracing::{info, warn};

use crate::shutdown::{ShutdownSender, StopReason};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Turns SIGINT/SIGTERM into a [`StopReason::Signal`] broadcast. The task
/// also exits when anything else broadcasts a stop first.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Received interrupt, stopping");
                    drop(shutdown_tx.send(StopReason::Signal));
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    info!("Received SIGTERM, stopping");
                    drop(shutdown_tx.send(StopReason::Signal));
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Received interrupt, stopping");
                    drop(shutdown_tx.send(StopReason::Signal));
                }
            }
        }
    })
}
