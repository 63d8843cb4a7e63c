//! Transport seam between the client and the network

use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::{BoxError, ConfigError},
    request::{Headers, Method},
    response::RawResponse,
};

/// Fully resolved request handed to a [`Transport`]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

/// Issues HTTP requests
///
/// Implementations must be cancel-safe: the client enforces timeouts by
/// dropping the future returned from [`Transport::send`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, BoxError>;
}

/// Production transport backed by `reqwest`
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport sending the given user agent
    ///
    /// No timeout is configured on the inner client; the caller bounds each
    /// call itself.
    pub fn new(user_agent: &str) -> Result<Self, ConfigError> {
        let inner = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ConfigError::BuildError(e.to_string()))?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, BoxError> {
        debug!(method = %request.method, url = %request.url, "HTTP request");

        let mut builder = self
            .inner
            .request(request.method.into(), request.url.as_str());

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await?.to_vec();

        debug!(status, bytes = body.len(), "HTTP response");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
