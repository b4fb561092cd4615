// Start of file: /src/config/environment.rs

// * Environment configuration for the task manager service.
// * Values come from the process environment, plus `.env` outside production.

use std::{borrow::Cow, collections::HashMap, time::Duration};
// * anyhow for convenient error handling
use anyhow::{Context, Result};
use tracing::warn;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const PRODUCTION_ENVIRONMENT: &str = "production";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_TIMEOUT: u64 = 30; // 30 seconds
const DEFAULT_SHUTDOWN_TIMEOUT: u64 = 35; // 35 seconds, must outlast DEFAULT_TIMEOUT
// ! Margin kept between the request timeout and the shutdown deadline
const SHUTDOWN_GRACE_SECONDS: u64 = 5;
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 3306; // Default MySQL port
const DEFAULT_DB_USER: &str = "root";
const DEFAULT_DB_PASSWORD: &str = "";

/// Name of the schema every instance of the service works against
pub const DATABASE_NAME: &str = "task_manager";

// * Everything the database handle needs to build its pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: Cow<'static, str>,
    pub port: u16,
    pub database: Cow<'static, str>,
    pub user: Cow<'static, str>,
    pub password: Cow<'static, str>,
    /// Statement logging; off in production
    pub debug: bool,
}

// * A struct containing all environment variables used by the app
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub max_request_body_size: usize,
    pub default_timeout_seconds: u64,
    pub shutdown_timeout_seconds: u64,
    pub db_host: Cow<'static, str>,
    pub db_port: u16,
    pub db_user: Cow<'static, str>,
    pub db_password: Cow<'static, str>,
}

impl EnvironmentVariables {
    // * Loads environment variables from the process.
    // * Only reads .env if ENV != "production".
    pub fn load() -> Result<Self> {
        // ? In non-production environments, attempt to load .env
        if std::env::var("ENV").unwrap_or_default() != PRODUCTION_ENVIRONMENT {
            dotenv::dotenv().ok();
        }

        Self::from_vars(std::env::vars())
    }

    // * Builds the configuration from an explicit set of key/value pairs,
    // * providing defaults where a variable is missing.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        // * A small helper closure to fetch a variable by key
        let get_var = |key: &str| vars.get(key).map(String::as_str);

        let mut env = Self {
            environment: get_var("ENV")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_ENVIRONMENT)),

            host: get_var("HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_HOST)),

            port: get_var("PORT")
                .map(|s| s.parse().context("Invalid PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),

            max_request_body_size: get_var("MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            shutdown_timeout_seconds: get_var("SHUTDOWN_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid SHUTDOWN_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),

            db_host: get_var("DB_HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_HOST, defaulting to '{DEFAULT_DB_HOST}'");
                    Cow::Borrowed(DEFAULT_DB_HOST)
                }),

            // ? A non-numeric DB_PORT falls back to the default instead of failing
            db_port: match get_var("DB_PORT").map(str::parse::<u16>) {
                Some(Ok(port)) => port,
                Some(Err(_)) => {
                    warn!("Invalid DB_PORT, defaulting to {DEFAULT_DB_PORT}");
                    DEFAULT_DB_PORT
                }
                None => DEFAULT_DB_PORT,
            },

            db_user: get_var("DB_USER")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_USER, defaulting to '{DEFAULT_DB_USER}'");
                    Cow::Borrowed(DEFAULT_DB_USER)
                }),

            db_password: get_var("DB_PASSWORD")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_PASSWORD, defaulting to an empty password");
                    Cow::Borrowed(DEFAULT_DB_PASSWORD)
                }),
        };

        env.outlast_request_timeout();
        Ok(env)
    }

    // * Closing the server waits for in-flight requests. A deadline that could
    // * expire first would let the pool close under a running request.
    fn outlast_request_timeout(&mut self) {
        if self.shutdown_timeout_seconds <= self.default_timeout_seconds {
            let raised = self.default_timeout_seconds + SHUTDOWN_GRACE_SECONDS;
            warn!(
                "SHUTDOWN_TIMEOUT_SECONDS ({}) does not exceed DEFAULT_TIMEOUT_SECONDS ({}), raising it to {raised}",
                self.shutdown_timeout_seconds, self.default_timeout_seconds
            );
            self.shutdown_timeout_seconds = raised;
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION_ENVIRONMENT
    }

    /// Connection settings for the relational store
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            database: Cow::Borrowed(DATABASE_NAME),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            debug: !self.is_production(),
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_seconds)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}


// End of file: /src/config/environment.rs
