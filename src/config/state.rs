// Dependency container shared with every request handler

use std::sync::Arc;

use crate::config::environment::EnvironmentVariables;
use crate::core::logging::Logger;
use crate::database::{DatabaseHandle, DatabaseService};

/// Wires the database handle and the logger into the state handed to axum.
#[derive(Debug)]
pub struct AppState<D = DatabaseService> {
    pub environment: Arc<EnvironmentVariables>,
    pub database: Arc<D>,
    pub logger: Logger,
}

// Manual impl: `D` itself need not be `Clone`, only the `Arc` is cloned
impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            environment: self.environment.clone(),
            database: self.database.clone(),
            logger: self.logger.clone(),
        }
    }
}

impl<D: DatabaseHandle> AppState<D> {
    /// Builds the container from its collaborators
    pub fn new(environment: Arc<EnvironmentVariables>, database: Arc<D>, logger: Logger) -> Self {
        Self {
            environment,
            database,
            logger,
        }
    }
}
