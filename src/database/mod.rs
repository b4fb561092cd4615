pub mod mysql_service;

pub use mysql_service::DatabaseService;

use anyhow::Result;
use async_trait::async_trait;

/// Operations the lifecycle and the request handlers need from the relational store.
#[async_trait]
pub trait DatabaseHandle: Send + Sync + 'static {
    /// Pooled connection handed out to request handlers.
    type Connection: Send;

    /// Acquires a connection, connecting on demand.
    async fn get_connection(&self) -> Result<Self::Connection>;

    /// Brings the schema up to date. Must finish before any request is served.
    async fn schema_migration(&self) -> Result<()>;

    /// Drains and closes the connection pool.
    async fn close_database(&self) -> Result<()>;
}
