//! Fixtures shared by unit tests.
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::args::HttpMethod;
use crate::catalog::Classification;
use crate::config::types::{ConfigFile, EndpointConfig};
use crate::config::{ConfigOverrides, TrafficConfig};
use crate::error::{AppResult, TransportError};
use crate::http::{PreparedRequest, Transport};

#[derive(Debug, Clone, Copy)]
pub(crate) enum MockBehavior {
    Immediate,
    Delay(Duration),
    Hang,
    Refuse,
}

/// In-memory transport that counts calls and the peak number of concurrent
/// sends.
#[derive(Debug)]
pub(crate) struct MockTransport {
    behavior: MockBehavior,
    status: u16,
    calls: AtomicU64,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockTransport {
    pub(crate) const fn new(behavior: MockBehavior, status: u16) -> Self {
        Self {
            behavior,
            status,
            calls: AtomicU64::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, _request: PreparedRequest) -> Result<u16, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.peak.fetch_max(active, Ordering::SeqCst);
        let result = match self.behavior {
            MockBehavior::Immediate => Ok(self.status),
            MockBehavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.status)
            }
            MockBehavior::Hang => std::future::pending().await,
            MockBehavior::Refuse => Err(TransportError::Connection {
                message: "connection refused".to_owned(),
            }),
        };
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub(crate) fn endpoint_config(name: &str, path: &str, weight: f64) -> EndpointConfig {
    EndpointConfig {
        name: Some(name.to_owned()),
        method: HttpMethod::Get,
        path: path.to_owned(),
        weight,
        classification: Classification::Good,
        payload: None,
        error_path: None,
        error_rate: None,
        error_variants: None,
        headers: None,
    }
}

/// Resolved config with a single GET endpoint and a fixed seed.
pub(crate) fn traffic_config(rate: f64, concurrency: usize) -> AppResult<TrafficConfig> {
    let file = ConfigFile {
        base_url: Some("http://127.0.0.1:9".to_owned()),
        rate: Some(rate),
        concurrency: Some(concurrency),
        seed: Some(7),
        endpoints: Some(vec![endpoint_config("root", "/", 1.0)]),
        ..ConfigFile::default()
    };
    TrafficConfig::resolve(file, &ConfigOverrides::default())
}

pub(crate) fn run_paused<F>(future: F) -> AppResult<()>
where
    F: std::future::Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()?;
    runtime.block_on(future)
}
