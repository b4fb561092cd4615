//! Initialization sequence of the service.
//!
//! ```text
//! logger → database → schema migration → container → HTTP server → listen
//! ```
//!
//! Every step needs the previous one. Any failure is returned as a single
//! [`AppError`] (code 10000) wrapping the original cause; no partially built
//! [`Application`] ever leaves this module.

use std::sync::Arc;

use anyhow::Result;
use tracing::Instrument;

use crate::config::environment::{DatabaseConfig, EnvironmentVariables};
use crate::config::state::AppState;
use crate::core::error::{AppError, INITIALIZATION_ERROR_MESSAGE};
use crate::core::logging::Logger;
use crate::core::server::{create_app, HttpServer, Listenable};
use crate::database::{DatabaseHandle, DatabaseService};

/// Everything a running service is made of.
#[derive(Debug)]
pub struct Application<D = DatabaseService, S = HttpServer> {
    pub logger: Logger,
    pub database: Arc<D>,
    pub server: S,
    /// Configuration the application was built from
    pub environment: Arc<EnvironmentVariables>,
}

/// Builds the database handle for a configuration.
pub trait Bootstrap: Send + Sync {
    type Database: DatabaseHandle;

    fn connect_database(&self, config: DatabaseConfig) -> Result<Self::Database>;
}

/// Production bootstrap: a lazily connecting MySQL pool
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlBootstrap;

impl Bootstrap for MySqlBootstrap {
    type Database = DatabaseService;

    fn connect_database(&self, config: DatabaseConfig) -> Result<DatabaseService> {
        Ok(DatabaseService::new(config))
    }
}

/// Initializes the service from the process environment.
pub async fn initialize() -> Result<Application, AppError> {
    let environment = EnvironmentVariables::load().map_err(AppError::initialization)?;
    initialize_with(environment, &MySqlBootstrap).await
}

/// Initializes the service from an explicit configuration and bootstrap.
pub async fn initialize_with<B: Bootstrap>(
    environment: EnvironmentVariables,
    bootstrap: &B,
) -> Result<Application<B::Database>, AppError> {
    let logger = Logger::new();

    start(&logger, environment, bootstrap)
        .instrument(logger.span().clone())
        .await
        .map_err(|cause| {
            logger.error(INITIALIZATION_ERROR_MESSAGE, &cause);
            AppError::initialization(cause)
        })
}

async fn start<B: Bootstrap>(
    logger: &Logger,
    environment: EnvironmentVariables,
    bootstrap: &B,
) -> Result<Application<B::Database>> {
    logger.info("Starting HTTP server");

    let environment = Arc::new(environment);
    let database = Arc::new(bootstrap.connect_database(environment.database_config())?);

    match listen(logger, environment.clone(), database.clone()).await {
        Ok(server) => Ok(Application {
            logger: logger.clone(),
            database,
            server,
            environment,
        }),
        Err(err) => {
            // Nothing built so far may outlive the failed call
            if let Err(close_err) = database.close_database().await {
                logger.error("Failed to release database after initialization error", &close_err);
            }
            Err(err)
        }
    }
}

async fn listen<D: DatabaseHandle>(
    logger: &Logger,
    environment: Arc<EnvironmentVariables>,
    database: Arc<D>,
) -> Result<HttpServer> {
    logger.info("Apply database migration");
    database.schema_migration().await?;

    let container = AppState::new(environment.clone(), database, logger.clone());
    let server = HttpServer::listen(create_app(container), &environment.listen_address()).await?;

    logger.info(&format!("Application running on port: {}", server.local_addr().port()));
    Ok(server)
}
