// Library root of the task manager service: bootstrap and lifecycle

pub mod api;
pub mod config;
pub mod core;
pub mod database;
pub mod utils;

pub use crate::config::environment::{DatabaseConfig, EnvironmentVariables};
pub use crate::config::state::AppState;
pub use crate::core::application::{initialize, initialize_with, Application, Bootstrap, MySqlBootstrap};
pub use crate::core::error::{AppError, ShutdownActionError};
pub use crate::core::lifecycle::{Lifecycle, LifecycleState};
pub use crate::core::logging::Logger;
pub use crate::core::server::{HttpServer, Listenable};
pub use crate::core::signals::{ChannelSignals, OsSignals, Signal, SignalSource};
pub use crate::database::{DatabaseHandle, DatabaseService};
