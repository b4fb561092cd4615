//! Graceful shutdown protocol.
//!
//! ```text
//! Running --(first signal)--> ShuttingDown --(actions attempted)--> Exited(code)
//! ```
//!
//! Shutdown runs two actions strictly in order: close the HTTP server, then
//! close the database pool. The server goes first so no request can reach
//! a closed pool. A failing or timed out action is logged and turns the exit
//! code to 1; the next action still runs.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::core::application::Application;
use crate::core::error::ShutdownActionError;
use crate::core::faults::spawn_observed;
use crate::core::logging::Logger;
use crate::core::server::Listenable;
use crate::core::signals::SignalSource;
use crate::database::DatabaseHandle;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    ShuttingDown,
    Exited(i32),
}

/// One-shot gate guarding entry into the shutdown sequence.
#[derive(Debug, Default)]
pub struct ShutdownGate {
    entered: AtomicBool,
}

impl ShutdownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` for exactly one caller, `false` for everyone after it.
    pub fn try_enter(&self) -> bool {
        !self.entered.swap(true, Ordering::SeqCst)
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }
}

type ActionFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// A named step of the shutdown sequence. Nothing runs until it is awaited.
pub struct ShutdownAction {
    name: &'static str,
    future: ActionFuture,
}

impl ShutdownAction {
    pub fn new<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name,
            future: Box::pin(future),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the action, failing with `TimedOut` once `deadline` elapses.
    pub async fn run(self, deadline: Duration) -> Result<(), ShutdownActionError> {
        match tokio::time::timeout(deadline, self.future).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(ShutdownActionError::Failed {
                action: self.name,
                source: source.into(),
            }),
            Err(_) => Err(ShutdownActionError::TimedOut {
                action: self.name,
                timeout: deadline,
            }),
        }
    }
}

/// Awaits `actions` one after the other and returns the process exit code.
pub async fn run_shutdown_actions(logger: &Logger, actions: Vec<ShutdownAction>, deadline: Duration) -> i32 {
    let mut exit_code = EXIT_SUCCESS;

    for action in actions {
        let name = action.name();
        match action.run(deadline).await {
            Ok(()) => info!(parent: logger.span(), action = name, "Shutdown action completed"),
            Err(err) => {
                logger.error("Error in graceful shutdown", &err);
                exit_code = EXIT_FAILURE;
            }
        }
    }

    exit_code
}

/// Drives a running [`Application`] to its exit code.
#[derive(Debug)]
pub struct Lifecycle {
    logger: Logger,
    gate: Arc<ShutdownGate>,
    state: watch::Sender<LifecycleState>,
    shutdown_timeout: Duration,
}

impl Lifecycle {
    pub fn new(logger: Logger, shutdown_timeout: Duration) -> Self {
        let (state, _) = watch::channel(LifecycleState::Running);

        Self {
            logger,
            gate: Arc::new(ShutdownGate::new()),
            state,
            shutdown_timeout,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Waits for the first signal, shuts `app` down and returns the exit code.
    ///
    /// Signals arriving after the first are logged and ignored.
    pub async fn run<D, S, Sig>(self, app: Application<D, S>, mut signals: Sig) -> i32
    where
        D: DatabaseHandle,
        S: Listenable,
        Sig: SignalSource + 'static,
    {
        match signals.recv().await {
            Some(signal) => self.logger.info(&format!("Received {signal}")),
            None => warn!(parent: self.logger.span(), "Signal source closed, shutting down"),
        }

        if !self.gate.try_enter() {
            // Somebody else already owns the shutdown
            return EXIT_FAILURE;
        }

        let logger = self.logger.clone();
        let watcher = spawn_observed(&self.logger, "duplicate signal watcher", async move {
            while let Some(signal) = signals.recv().await {
                warn!(parent: logger.span(), %signal, "Shutdown already in progress, ignoring signal");
            }
            Ok(())
        });

        let exit_code = self.shutdown_sequence(app).await;
        watcher.abort();
        exit_code
    }

    /// Runs the shutdown sequence without waiting for a signal. Only the
    /// first caller does any work; later callers get exit code 1.
    ///
    /// A refused `app` is dropped without running its close actions. Dropping
    /// an [`HttpServer`](crate::core::server::HttpServer) still stops it
    /// gracefully; a database pool is released when its last handle goes.
    pub async fn shutdown<D, S>(&self, app: Application<D, S>) -> i32
    where
        D: DatabaseHandle,
        S: Listenable,
    {
        if !self.gate.try_enter() {
            warn!(parent: self.logger.span(), "Shutdown already in progress, ignoring request");
            return EXIT_FAILURE;
        }

        self.shutdown_sequence(app).await
    }

    async fn shutdown_sequence<D, S>(&self, app: Application<D, S>) -> i32
    where
        D: DatabaseHandle,
        S: Listenable,
    {
        self.state.send_replace(LifecycleState::ShuttingDown);
        self.logger.info("Starting graceful shutdown");

        let Application { server, database, .. } = app;
        let actions = vec![
            ShutdownAction::new("close HTTP server", server.close()),
            ShutdownAction::new("close database", async move { database.close_database().await }),
        ];

        let exit_code = run_shutdown_actions(&self.logger, actions, self.shutdown_timeout).await;

        self.state.send_replace(LifecycleState::Exited(exit_code));
        self.logger.info(&format!("Graceful shutdown finished with exit code {exit_code}"));
        exit_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn gate_opens_once() {
        let gate = ShutdownGate::new();
        assert!(!gate.is_entered());
        assert!(gate.try_enter());
        assert!(!gate.try_enter());
        assert!(gate.is_entered());
    }

    #[tokio::test]
    async fn actions_run_in_order_and_failures_do_not_stop_the_sequence() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (first, second) = (calls.clone(), calls.clone());

        let actions = vec![
            ShutdownAction::new("first", async move {
                first.lock().unwrap().push("first");
                anyhow::bail!("first failed")
            }),
            ShutdownAction::new("second", async move {
                second.lock().unwrap().push("second");
                Ok(())
            }),
        ];

        let code = run_shutdown_actions(&Logger::new(), actions, Duration::from_secs(1)).await;

        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn all_successful_actions_exit_zero() {
        let actions = vec![
            ShutdownAction::new("a", async { Ok(()) }),
            ShutdownAction::new("b", async { Ok(()) }),
        ];

        assert_eq!(run_shutdown_actions(&Logger::new(), actions, Duration::from_secs(1)).await, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn hanging_action_times_out() {
        let action = ShutdownAction::new("hang", std::future::pending());

        let err = action.run(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, ShutdownActionError::TimedOut { action: "hang", .. }));
    }

    #[test]
    fn actions_are_lazy() {
        let started = Arc::new(AtomicBool::new(false));
        let flag = started.clone();

        let action = ShutdownAction::new("lazy", async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(action.name(), "lazy");
        assert!(!started.load(Ordering::SeqCst));
    }
}
