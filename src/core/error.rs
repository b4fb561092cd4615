//! Error types of the application lifecycle.

use std::time::Duration;

use thiserror::Error;

/// Boxed cause carried by the lifecycle errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Code reported when the initialization sequence fails.
pub const INITIALIZATION_ERROR_CODE: u32 = 10000;
pub const INITIALIZATION_ERROR_MESSAGE: &str = "error occurred while initializing application";

/// Application-level error with a stable numeric code and the original cause.
#[derive(Debug, Error)]
#[error("{message} (code {code})")]
pub struct AppError {
    pub code: u32,
    pub message: String,
    #[source]
    pub source: BoxError,
}

impl AppError {
    pub fn new(code: u32, message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            code,
            message: message.into(),
            source: source.into(),
        }
    }

    /// Wraps any failure of the initialization sequence.
    pub fn initialization(cause: anyhow::Error) -> Self {
        Self::new(INITIALIZATION_ERROR_CODE, INITIALIZATION_ERROR_MESSAGE, cause)
    }
}

/// Failure of a single graceful shutdown action.
#[derive(Debug, Error)]
pub enum ShutdownActionError {
    /// The action ran and reported an error.
    #[error("shutdown action '{action}' failed: {source}")]
    Failed {
        action: &'static str,
        #[source]
        source: BoxError,
    },

    /// The action did not finish before its deadline.
    #[error("shutdown action '{action}' did not complete within {timeout:?}")]
    TimedOut {
        action: &'static str,
        timeout: Duration,
    },
}

impl ShutdownActionError {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Failed { action, .. } | Self::TimedOut { action, .. } => action,
        }
    }
}
