//! Uniform error captured when a pipeline step fails

use std::{any::Any, error::Error, fmt};

/// Boxed error accepted from step functions
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Error raised by a step, normalized to one representation
///
/// Steps may fail with any error type or with a plain message (`String`,
/// `&str`). Either way the display text is kept, and typed errors stay
/// reachable through [`StepError::downcast_ref`].
#[derive(Debug)]
pub struct StepError {
    message: String,
    inner: BoxError,
}

impl StepError {
    pub fn new(error: impl Into<BoxError>) -> Self {
        let inner = error.into();
        Self {
            message: inner.to_string(),
            inner,
        }
    }

    /// Error for a step that panicked instead of returning
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::new(format!("step panicked: {detail}"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error as raised by the step
    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner.as_ref())
    }
}
