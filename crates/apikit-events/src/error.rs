//! Error types for listener failures

use thiserror::Error;

/// Boxed error a listener may return
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a listener did not complete
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listener returned an error
    #[error("listener failed: {0}")]
    Failed(#[source] BoxError),

    /// The listener panicked; the payload message when it was a string
    #[error("listener panicked: {0}")]
    Panicked(String),
}

impl ListenerError {
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked(message)
    }
}
