use std::fmt;

use tokio::sync::broadcast;

/// Broadcast channel size for shutdown notifications (single signal fan-out).
const SHUTDOWN_CHANNEL_CAPACITY: usize = 4;

/// Why dispatch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// SIGINT or SIGTERM.
    Signal,
    /// The configured run duration elapsed.
    DurationElapsed,
}

impl StopReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StopReason::Signal => "signal",
            StopReason::DurationElapsed => "duration elapsed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

pub type ShutdownSender = broadcast::Sender<StopReason>;
pub type ShutdownReceiver = broadcast::Receiver<StopReason>;

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    broadcast::channel::<StopReason>(SHUTDOWN_CHANNEL_CAPACITY)
}
