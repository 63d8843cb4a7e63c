//! HTTP client implementation

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    error::{ApiError, ConfigError, Result},
    interceptor::{RequestInterceptor, ResponseInterceptor},
    middleware::RetryMiddleware,
    request::{Headers, Method, QueryParams, RequestDescriptor},
    response::{decode_payload, ApiResponse, RawResponse},
    transport::{ReqwestTransport, Transport, TransportRequest},
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Typed HTTP client
///
/// Every operation resolves to an [`ApiResponse`]; failures are reported in
/// its `Error` variant and never returned or panicked out of the call.
///
/// The client is `Send + Sync` and meant to be shared behind an `Arc`. The auth
/// token and the interceptor lists are read once per attempt, so updates apply
/// to attempts that start afterwards.
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    retry: RetryMiddleware,
    auth_token: RwLock<Option<String>>,
    request_interceptors: RwLock<Arc<Vec<Arc<dyn RequestInterceptor>>>>,
    response_interceptors: RwLock<Arc<Vec<Arc<dyn ResponseInterceptor>>>>,
}

impl ApiClient {
    /// Create a client using the `reqwest` transport
    pub fn new(config: ClientConfig) -> std::result::Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over any [`Transport`]
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            retry: RetryMiddleware::new(config.retry.clone()),
            auth_token: RwLock::new(config.auth_token.clone()),
            request_interceptors: RwLock::new(Arc::new(Vec::new())),
            response_interceptors: RwLock::new(Arc::new(Vec::new())),
            transport,
            config,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace the bearer token used by subsequent requests
    pub fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write() = token;
    }

    pub fn auth_token(&self) -> Option<String> {
        self.auth_token.read().clone()
    }

    /// Append a request interceptor
    pub fn add_request_interceptor(&self, interceptor: impl RequestInterceptor + 'static) {
        let mut guard = self.request_interceptors.write();
        let mut list = Vec::clone(&guard);
        list.push(Arc::new(interceptor));
        *guard = Arc::new(list);
    }

    /// Append a response interceptor
    pub fn add_response_interceptor(&self, interceptor: impl ResponseInterceptor + 'static) {
        let mut guard = self.response_interceptors.write();
        let mut list = Vec::clone(&guard);
        list.push(Arc::new(interceptor));
        *guard = Arc::new(list);
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<QueryParams>,
    ) -> ApiResponse<T> {
        let mut request = RequestDescriptor::new(Method::Get, path);
        request.params = params;
        self.execute(request).await
    }

    /// Execute a POST request
    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Post, path, body).await
    }

    /// Execute a PUT request
    pub async fn put<T, B>(&self, path: &str, body: Option<&B>) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Put, path, body).await
    }

    /// Execute a PATCH request
    pub async fn patch<T, B>(&self, path: &str, body: Option<&B>) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Patch, path, body).await
    }

    /// Execute a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        self.execute(RequestDescriptor::new(Method::Delete, path))
            .await
    }

    async fn send_with_body<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = RequestDescriptor::new(method, path);

        if let Some(body) = body {
            match serde_json::to_value(body) {
                Ok(value) => request.body = Some(value),
                Err(e) => {
                    return ApiResponse::error(ApiError::network(
                        format!("Failed to serialize request body: {e}"),
                        Some(Box::new(e)),
                    ))
                }
            }
        }

        self.execute(request).await
    }

    /// Execute a request descriptor with retries
    ///
    /// Only the exchange is retried. Once a 2xx response arrives its payload
    /// is decoded exactly once, and a decode failure is reported without
    /// sending the request again.
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestDescriptor) -> ApiResponse<T> {
        let method = request.method;
        let url = request.url.as_str();

        let result = self
            .retry
            .execute(|attempt| {
                let request = request.clone();
                async move {
                    debug!(%method, url, attempt, "Executing request");
                    AssertUnwindSafe(self.attempt(request))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| Err(panicked(panic)))
                }
            })
            .await
            .and_then(|response| response.payload())
            .and_then(decode_payload::<T>);

        if let Err(e) = &result {
            warn!(%method, url, kind = %e.kind(), error = %e, "Request failed");
        }

        result.into()
    }

    /// One attempt: auth, interceptors, resolution, timeout-bounded send, status check
    async fn attempt(&self, mut request: RequestDescriptor) -> Result<RawResponse> {
        if let Some(token) = self.auth_token() {
            request
                .headers
                .insert("Authorization", format!("Bearer {token}"));
        }

        let request_interceptors = Arc::clone(&self.request_interceptors.read());
        for interceptor in request_interceptors.iter() {
            request = interceptor.intercept(request).await;
        }

        let url = resolve_url(&self.config.base_url, &request.url, request.params.as_ref());

        let headers = merged_headers(&self.config, &request);
        let body = request
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ApiError::network("Failed to serialize request body", Some(Box::new(e))))?;

        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let outgoing = TransportRequest {
            method: request.method,
            url,
            headers,
            body,
        };

        let mut response = self.send_with_timeout(outgoing, timeout).await?;

        let response_interceptors = Arc::clone(&self.response_interceptors.read());
        for interceptor in response_interceptors.iter() {
            response = interceptor.intercept(response).await;
        }

        if !response.is_success() {
            return Err(ApiError::http(response.status, response.error_body()));
        }

        Ok(response)
    }

    async fn send_with_timeout(
        &self,
        request: TransportRequest,
        timeout: Duration,
    ) -> Result<RawResponse> {
        match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ApiError::network(
                format!("Network request failed: {e}"),
                Some(e),
            )),
            // The elapsed branch drops the transport future, aborting the call
            Err(_) => Err(ApiError::timeout(timeout)),
        }
    }
}

/// A panic inside an interceptor or the transport, as an unclassified failure
fn panicked(payload: Box<dyn Any + Send>) -> ApiError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    ApiError::network(format!("Request attempt panicked: {detail}"), None)
}

/// Resolve a request path against the base URL and append query parameters
///
/// Paths that carry a URI scheme (`https://...`) are used as-is; anything else
/// is joined to the base URL with a single `/`.
pub fn resolve_url(base_url: &str, path: &str, params: Option<&QueryParams>) -> String {
    let mut url = if has_scheme(path) {
        path.to_string()
    } else if path.is_empty() {
        base_url.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };

    if let Some(params) = params.filter(|p| !p.is_empty()) {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&params.to_query_string());
    }

    url
}

fn has_scheme(path: &str) -> bool {
    match path.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Headers the client would send for `request`, without auth or interceptors
pub(crate) fn merged_headers(config: &ClientConfig, request: &RequestDescriptor) -> Headers {
    let mut headers = config.default_headers.merged_with(&request.headers);
    if request.body.is_some() && !headers.contains("content-type") {
        headers.insert("content-type", JSON_CONTENT_TYPE);
    }
    headers
}
