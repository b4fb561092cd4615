//! Process-wide fault observers.
//!
//! Both observers only log. A panicking request handler takes down its own
//! task, not the process; a panic on the main task still ends the process
//! through the default hook, which runs after ours.

use std::any::Any;
use std::future::Future;
use std::sync::Once;

use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, Instrument};

use crate::core::logging::Logger;

static PANIC_HOOK: Once = Once::new();

/// Logs every panic at error severity, then hands over to the previous hook.
/// Only the first call installs anything.
pub fn install_panic_hook(logger: Logger) {
    PANIC_HOOK.call_once(move || {
        let previous = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| l.to_string())
                .unwrap_or_else(|| String::from("unknown"));

            error!(
                parent: logger.span(),
                panic = %panic_message(info.payload()),
                location = %location,
                "Uncaught panic"
            );

            previous(info);
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("non-string panic payload")
    }
}

/// Task started by [`spawn_observed`]
#[derive(Debug)]
pub struct ObservedTask {
    abort: AbortHandle,
    supervisor: JoinHandle<()>,
}

impl ObservedTask {
    /// Aborts the observed task; it is not reported as a failure.
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Resolves once the supervisor has reported the task's outcome.
    pub async fn reported(self) {
        let _ = self.supervisor.await;
    }
}

/// Spawns a detached task whose failure nobody awaits.
///
/// A supervisor logs an `Err` result or a panic at info severity, together
/// with the operation name and the tokio task id. An aborted task is not
/// reported.
pub fn spawn_observed<F>(logger: &Logger, operation: &'static str, future: F) -> ObservedTask
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let handle = tokio::spawn(future.instrument(logger.span().clone()));
    let abort = handle.abort_handle();
    let task_id = handle.id();
    let logger = logger.clone();

    let supervisor = tokio::spawn(async move {
        match handle.await {
            Ok(Ok(())) => debug!(parent: logger.span(), operation, task = %task_id, "Background task finished"),
            Ok(Err(reason)) => info!(
                parent: logger.span(),
                operation,
                task = %task_id,
                reason = %format!("{reason:#}"),
                "Unhandled task failure"
            ),
            Err(join_error) if join_error.is_cancelled() => {
                debug!(parent: logger.span(), operation, task = %task_id, "Background task aborted")
            }
            Err(join_error) => info!(
                parent: logger.span(),
                operation,
                task = %task_id,
                reason = %join_error,
                "Unhandled task panic"
            ),
        }
    });

    ObservedTask { abort, supervisor }
}
