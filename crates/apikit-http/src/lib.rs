//! Typed HTTP client with interceptors and retries
//!
//! Every request funnels through one execution path that injects the bearer
//! token, runs request interceptors, resolves the URL against the base URL,
//! enforces a timeout, runs response interceptors and classifies failures.
//! The whole attempt is wrapped in a retry loop with exponential backoff and
//! full jitter.
//!
//! ## Features
//!
//! - **Envelope results**: operations return [`ApiResponse`] instead of failing
//! - **Error taxonomy**: network, timeout and HTTP status errors under [`ApiError`]
//! - **Interceptors**: sync closures or async trait implementations
//! - **Trait-based transport**: mockable via [`Transport`], `reqwest` by default
//! - **Configurable**: serde/TOML loadable [`ClientConfig`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use apikit_http::{ApiClient, ApiResponse, ClientConfig, QueryParams};
//!
//! let client = ApiClient::new(ClientConfig::new("https://api.example.com"))?;
//! let params = QueryParams::new().with("q", "hello world");
//!
//! match client.get::<serde_json::Value>("/search", Some(params)).await {
//!     ApiResponse::Success { data } => println!("{data}"),
//!     ApiResponse::Error { error } => eprintln!("{}: {error}", error.kind()),
//!     ApiResponse::Loading => unreachable!(),
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod middleware;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{resolve_url, ApiClient};
pub use config::ClientConfig;
pub use error::{ApiError, BoxError, ConfigError, ErrorKind, Result};
pub use interceptor::{RequestInterceptor, ResponseInterceptor};
pub use middleware::{RetryMiddleware, RetryPolicy};
pub use request::{Headers, Method, QueryParams, QueryValue, RequestDescriptor};
pub use response::{ApiResponse, RawResponse};
pub use transport::{ReqwestTransport, Transport, TransportRequest};
