//! Sources of termination signals for the lifecycle controller.
//!
//! The controller never talks to the OS directly: it is handed a
//! [`SignalSource`], which is [`OsSignals`] in the binary and a
//! [`ChannelSignals`] in tests.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGTERM
    Terminate,
    /// SIGINT / Ctrl+C
    Interrupt,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Terminate => f.write_str("SIGTERM"),
            Signal::Interrupt => f.write_str("SIGINT"),
        }
    }
}

#[async_trait]
pub trait SignalSource: Send {
    /// Waits for the next signal. `None` once no more signals can arrive.
    async fn recv(&mut self) -> Option<Signal>;
}

/// Termination signals delivered by the operating system
#[derive(Debug)]
pub struct OsSignals {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
}

impl OsSignals {
    /// Registers the process-wide handlers. Call once, from inside the runtime.
    #[cfg(unix)]
    pub fn install() -> Result<Self> {
        use anyhow::Context;
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            terminate: signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?,
            interrupt: signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> Result<Self> {
        Ok(Self {})
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    #[cfg(unix)]
    async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            received = self.terminate.recv() => received.map(|_| Signal::Terminate),
            received = self.interrupt.recv() => received.map(|_| Signal::Interrupt),
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Option<Signal> {
        tokio::signal::ctrl_c().await.ok().map(|_| Signal::Interrupt)
    }
}

/// In-process signal source fed through a channel
#[derive(Debug)]
pub struct ChannelSignals {
    rx: mpsc::UnboundedReceiver<Signal>,
}

/// Sending half of a [`ChannelSignals`]
pub type SignalSender = mpsc::UnboundedSender<Signal>;

impl ChannelSignals {
    pub fn channel() -> (SignalSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl SignalSource for ChannelSignals {
    async fn recv(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }
}
