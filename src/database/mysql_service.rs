// =============================================================================
// DATABASE SERVICE - MySQL connection pool and schema migration
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{ConnectOptions, MySqlPool};
use log::LevelFilter;
use tracing::{debug, info};

use crate::config::environment::DatabaseConfig;
use crate::database::DatabaseHandle;

// =============================================================================
// SQL CONSTANTS
// =============================================================================

/// Bootstrap tables of the task manager
const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

// =============================================================================
// DATABASE SERVICE
// =============================================================================

/// Database service owning the single MySQL connection pool of the process.
/// Connections are opened on demand; nothing touches the network until the
/// first query.
#[derive(Clone, Debug)]
pub struct DatabaseService {
    pool: MySqlPool,
    config: DatabaseConfig,
}

impl DatabaseService {
    /// Creates the service and its (lazy) pool from the given configuration.
    pub fn new(config: DatabaseConfig) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .min_connections(0)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(30))
            .connect_lazy_with(Self::connect_options(&config));

        Self { pool, config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

// =============================================================================
// INTERNAL HELPERS
// =============================================================================

impl DatabaseService {
    /// Connection options; statement logging follows the debug flag
    fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        if config.debug {
            options.log_statements(LevelFilter::Debug)
        } else {
            options.disable_statement_logging()
        }
    }
}

#[async_trait]
impl DatabaseHandle for DatabaseService {
    type Connection = PoolConnection<MySql>;

    async fn get_connection(&self) -> Result<Self::Connection> {
        self.pool
            .acquire()
            .await
            .context("Failed to acquire database connection")
    }

    async fn schema_migration(&self) -> Result<()> {
        info!(host = %self.config.host, database = %self.config.database, "Executing schema migration...");

        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .context("Failed to execute schema migration SQL")?;

        info!("Schema migration completed");
        Ok(())
    }

    async fn close_database(&self) -> Result<()> {
        if self.pool.is_closed() {
            debug!("Database pool already closed, nothing to do");
            return Ok(());
        }

        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            host: Cow::Borrowed("db"),
            port: 3306,
            database: Cow::Borrowed("task_manager"),
            user: Cow::Borrowed("u"),
            password: Cow::Borrowed("p"),
            debug: true,
        }
    }

    #[tokio::test]
    async fn construction_does_not_connect() {
        let service = DatabaseService::new(config());

        assert_eq!(service.config().host, "db");
        assert_eq!(service.pool().size(), 0);
        assert!(!service.pool().is_closed());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let service = DatabaseService::new(config());

        service.close_database().await.unwrap();
        assert!(service.pool().is_closed());
        service.close_database().await.unwrap();
    }

    #[tokio::test]
    async fn closed_pool_refuses_connections() {
        let service = DatabaseService::new(config());
        service.close_database().await.unwrap();

        assert!(service.get_connection().await.is_err());
    }
}
