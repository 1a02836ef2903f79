use async_trait::async_trait;

use crate::error::TransportError;

use super::PreparedRequest;

/// Sends one request and reports its status code. Failures are per request
/// and never abort the run.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<u16, TransportError>;
}
