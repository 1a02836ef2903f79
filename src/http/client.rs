use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::args::DEFAULT_USER_AGENT;
use crate::config::TrafficConfig;
use crate::error::{AppError, AppResult, HttpError, TransportError, ValidationError};

use super::{PreparedRequest, Transport};

const TRAFFIC_TYPE_HEADER: &str = "x-traffic-type";

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the client with the configured timeouts and default headers.
    ///
    /// # Errors
    ///
    /// Returns an error when the traffic type is not a valid header value or
    /// the HTTP client cannot be built.
    pub fn new(config: &TrafficConfig) -> AppResult<Self> {
        let traffic_type = HeaderValue::from_str(&config.traffic_type).map_err(|err| {
            AppError::validation(ValidationError::InvalidHeaderValue {
                header: TRAFFIC_TYPE_HEADER.to_owned(),
                source: err,
            })
        })?;
        let mut default_headers = HeaderMap::new();
        default_headers.insert(HeaderName::from_static(TRAFFIC_TYPE_HEADER), traffic_type);

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(default_headers)
            .build()
            .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<u16, TransportError> {
        let mut builder = self.client.request(request.method.into(), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::from_reqwest(&err))?;
        let status = response.status().as_u16();
        drain_response_body(response)
            .await
            .map_err(|err| TransportError::from_reqwest(&err))?;
        Ok(status)
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
