//! tests/common/mod.rs
//! Shared test helpers: in-memory doubles for the database and the server,
//! and a helper that boots the whole application on an ephemeral port and
//! drives it over HTTP.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use task_manager::core::logging::init_tracing;
use task_manager::{
    initialize_with, Application, Bootstrap, DatabaseConfig, DatabaseHandle, EnvironmentVariables,
    Listenable, Logger,
};

/// Ordered record of collaborator calls, shared between doubles
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

// =============================================================================
// DATABASE DOUBLE
// =============================================================================

/// Connection handed out by [`FakeDatabase`]
#[derive(Debug)]
pub struct FakeConnection;

#[derive(Debug)]
pub struct FakeDatabase {
    pub config: DatabaseConfig,
    pub migration_error: Option<&'static str>,
    pub close_error: Option<&'static str>,
    /// Time every `get_connection` takes before it answers
    pub acquire_delay: Option<Duration>,
    closed: Mutex<bool>,
    calls: CallLog,
}

impl FakeDatabase {
    pub fn new(config: DatabaseConfig, calls: CallLog) -> Self {
        Self {
            config,
            migration_error: None,
            close_error: None,
            acquire_delay: None,
            closed: Mutex::new(false),
            calls,
        }
    }

    pub fn failing_close(mut self, message: &'static str) -> Self {
        self.close_error = Some(message);
        self
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl DatabaseHandle for FakeDatabase {
    type Connection = FakeConnection;

    async fn get_connection(&self) -> Result<FakeConnection> {
        if let Some(delay) = self.acquire_delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push("database.get_connection");
        if self.is_closed() {
            bail!("pool closed");
        }
        Ok(FakeConnection)
    }

    async fn schema_migration(&self) -> Result<()> {
        self.calls.lock().unwrap().push("database.schema_migration");
        match self.migration_error {
            Some(message) => bail!(message),
            None => Ok(()),
        }
    }

    async fn close_database(&self) -> Result<()> {
        self.calls.lock().unwrap().push("database.close");
        *self.closed.lock().unwrap() = true;
        match self.close_error {
            Some(message) => bail!(message),
            None => Ok(()),
        }
    }
}

/// Bootstrap producing [`FakeDatabase`]s
#[derive(Debug, Default)]
pub struct FakeBootstrap {
    pub migration_error: Option<&'static str>,
    pub acquire_delay: Option<Duration>,
    pub calls: CallLog,
}

impl FakeBootstrap {
    pub fn failing_migration(message: &'static str) -> Self {
        Self {
            migration_error: Some(message),
            ..Self::default()
        }
    }

    pub fn slow_connections(delay: Duration) -> Self {
        Self {
            acquire_delay: Some(delay),
            ..Self::default()
        }
    }
}

impl Bootstrap for FakeBootstrap {
    type Database = FakeDatabase;

    fn connect_database(&self, config: DatabaseConfig) -> Result<FakeDatabase> {
        self.calls.lock().unwrap().push("database.connect");
        let mut database = FakeDatabase::new(config, self.calls.clone());
        database.migration_error = self.migration_error;
        database.acquire_delay = self.acquire_delay;
        Ok(database)
    }
}

// =============================================================================
// SERVER DOUBLE
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub enum CloseBehavior {
    Succeed,
    Fail,
    Hang,
}

#[derive(Debug)]
pub struct FakeServer {
    pub behavior: CloseBehavior,
    calls: CallLog,
}

impl FakeServer {
    pub fn new(behavior: CloseBehavior, calls: CallLog) -> Self {
        Self { behavior, calls }
    }
}

#[async_trait]
impl Listenable for FakeServer {
    fn local_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    async fn close(self) -> Result<()> {
        self.calls.lock().unwrap().push("server.close");
        match self.behavior {
            CloseBehavior::Succeed => Ok(()),
            CloseBehavior::Fail => bail!("server close failed"),
            CloseBehavior::Hang => std::future::pending().await,
        }
    }
}

/// Application record assembled from doubles, as `initialize` would return it
pub fn fake_application(
    server: CloseBehavior,
    database_close_error: Option<&'static str>,
    calls: &CallLog,
) -> Application<FakeDatabase, FakeServer> {
    let environment = test_environment(&[]);
    let mut database = FakeDatabase::new(environment.database_config(), calls.clone());
    if let Some(message) = database_close_error {
        database = database.failing_close(message);
    }

    Application {
        logger: Logger::new(),
        database: Arc::new(database),
        server: FakeServer::new(server, calls.clone()),
        environment: Arc::new(environment),
    }
}

// =============================================================================
// RUNNING APPLICATION HELPERS
// =============================================================================

/// Configuration for tests: loopback, ephemeral port, unless overridden
pub fn test_environment(overrides: &[(&str, &str)]) -> EnvironmentVariables {
    let mut vars: Vec<(String, String)> = vec![
        ("ENV".into(), "test".into()),
        ("HOST".into(), "127.0.0.1".into()),
        ("PORT".into(), "0".into()),
        ("DB_HOST".into(), "localhost".into()),
        ("DB_USER".into(), "tester".into()),
        ("DB_PASSWORD".into(), "secret".into()),
    ];
    vars.extend(overrides.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    EnvironmentVariables::from_vars(vars).expect("test environment is valid")
}

pub struct TestApp {
    pub app: Application<FakeDatabase>,
    pub base_url: String,
    pub client: reqwest::Client,
    pub calls: CallLog,
}

/// Initializes the application against an in-memory database double.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(FakeBootstrap::default()).await
}

pub async fn spawn_app_with(bootstrap: FakeBootstrap) -> TestApp {
    init_tracing();

    let calls = bootstrap.calls.clone();
    let app = initialize_with(test_environment(&[]), &bootstrap)
        .await
        .expect("Failed to initialize application");

    let base_url = format!("http://{}", app.server.local_addr());

    TestApp {
        app,
        base_url,
        client: reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client"),
        calls,
    }
}

impl TestApp {
    pub async fn get(&self, path: &str, expected: StatusCode) -> Value {
        let resp: reqwest::Response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Failed to execute request.");

        Self::expect_json(resp, expected).await
    }

    pub async fn post_json(&self, path: &str, body: &Value, expected: StatusCode) -> Value {
        let resp: reqwest::Response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.");

        Self::expect_json(resp, expected).await
    }

    /// Acquires a database connection the way a table reset would
    pub async fn truncate_tables(&self) -> FakeConnection {
        self.app
            .database
            .get_connection()
            .await
            .expect("Failed to acquire connection")
    }

    async fn expect_json(resp: reqwest::Response, expected: StatusCode) -> Value {
        assert_eq!(resp.status(), expected);
        let body: String = resp.text().await.expect("Failed to read body");
        serde_json::from_str(&body).expect("Body is not JSON")
    }
}
