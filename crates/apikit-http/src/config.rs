//! HTTP client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, middleware::duration_ms, request::Headers, RetryPolicy};

/// HTTP client configuration
///
/// Everything except the auth token is fixed once the client is built; the
/// token can be replaced at runtime through [`crate::ApiClient::set_auth_token`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Prefix for every relative request path
    pub base_url: String,

    /// Default request timeout
    #[serde(default = "default_timeout", with = "duration_ms")]
    pub timeout: Duration,

    /// Headers sent with every request
    #[serde(default)]
    pub default_headers: Headers,

    /// Retry and backoff policy
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Bearer token injected as `Authorization` on every request
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a config for the given base URL with defaults for everything else
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: default_timeout(),
            default_headers: Headers::new(),
            retry: RetryPolicy::default(),
            auth_token: None,
            user_agent: default_user_agent(),
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config = Self::from_toml_table(toml::from_str(source)?)?;
        config.validate()?;
        Ok(config)
    }

    /// Deserialize an already parsed TOML table without validating it
    ///
    /// Lets callers patch the table or the result before [`Self::validate`].
    pub fn from_toml_table(table: toml::Table) -> Result<Self, ConfigError> {
        Ok(toml::Value::Table(table).try_into::<Self>()?)
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Set retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the initial auth token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check the values a client cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "base URL is empty".to_string(),
            });
        }

        url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(ConfigError::InvalidRetryPolicy(format!(
                "backoff multiplier must be a finite value >= 1.0, got {multiplier}"
            )));
        }

        if self.retry.initial_delay > self.retry.max_delay {
            return Err(ConfigError::InvalidRetryPolicy(
                "initial delay exceeds max delay".to_string(),
            ));
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_timeout() -> Duration {
    Duration::from_millis(30_000)
}

fn default_user_agent() -> String {
    format!("apikit/{}", env!("CARGO_PKG_VERSION"))
}
