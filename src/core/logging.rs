// Start of file: /src/core/logging.rs

use std::fmt;

use tracing::{error, info, info_span, Span};
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

const DEFAULT_FILTER: &str = "task_manager=info,tower_http=debug,axum=info,sqlx=warn";

// Initialize the tracing subscriber with default configuration.
// Safe to call more than once: later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter: EnvFilter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = subscriber_fmt()
        .with_env_filter(env_filter)
        .try_init();
}

/// Process-wide logger handle shared by every component.
///
/// Wraps the root application span, so every event logged through it (and
/// every future instrumented with [`Logger::span`]) is attributed to the
/// service.
#[derive(Clone, Debug)]
pub struct Logger {
    span: Span,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            span: info_span!("task_manager", pid = std::process::id()),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn info(&self, message: &str) {
        info!(parent: &self.span, "{message}");
    }

    /// Info event carrying a structured payload
    pub fn info_with<T: fmt::Debug + ?Sized>(&self, message: &str, payload: &T) {
        info!(parent: &self.span, payload = ?payload, "{message}");
    }

    pub fn error<E: fmt::Debug + ?Sized>(&self, message: &str, err: &E) {
        error!(parent: &self.span, error = ?err, "{message}");
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

// End of file: /src/core/logging.rs
