// Application server configuration and setup

use std::net::SocketAddr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    Router,
    middleware::from_fn,
    extract::DefaultBodyLimit,
    error_handling::HandleErrorLayer,
    http::StatusCode,
};
use listenfd::ListenFd;
use serde_json::json;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tracing::{debug, info};

use crate::api::health::health_routes;
use crate::config::environment::EnvironmentVariables;
use crate::config::state::AppState;
use crate::database::DatabaseHandle;
use crate::utils::{
    error_handler::handle_global_error,
    response_handler::{HandlerResponse, response_wrapper},
};

/// A bound server that can be shut down once.
#[async_trait]
pub trait Listenable: Send + 'static {
    /// Address the listener is bound to
    fn local_addr(&self) -> SocketAddr;

    /// Stops accepting connections and waits for in-flight requests to drain.
    async fn close(self) -> Result<()>;
}

/// Creates and configures the application router with all middleware layers
pub fn create_app<D: DatabaseHandle>(state: AppState<D>) -> Router {
    let env: &EnvironmentVariables = &state.environment;
    let (request_timeout, max_body_size) = (env.request_timeout(), env.max_request_body_size);

    Router::new()
        .merge(health_routes::<D>())
        // Add new routes here
        .fallback(fallback_handler)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(response_wrapper))
                .layer(HandleErrorLayer::new(handle_global_error))
                .layer(TimeoutLayer::new(request_timeout))
                .layer(DefaultBodyLimit::max(max_body_size))
        )
        .with_state(state)
}

async fn fallback_handler() -> HandlerResponse {
    HandlerResponse::new(StatusCode::NOT_FOUND)
        .data(json!({ "error": "route_not_found" }))
        .message("The requested route does not exist")
}

/// Takes the listener handed over by the environment (systemfd, socket
/// activation) or binds a new one on `address`
pub async fn setup_listener(address: &str) -> Result<TcpListener> {
    let mut listenfd: ListenFd = ListenFd::from_env();

    let listener: TcpListener = match listenfd.take_tcp_listener(0)? {
        Some(std_listener) => {
            debug!("Using TCP listener inherited through listenfd");
            std_listener.set_nonblocking(true)?;
            TcpListener::from_std(std_listener)?
        }
        None => TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to bind HTTP listener on {address}"))?,
    };

    Ok(listener)
}

/// HTTP server running in a background task
#[derive(Debug)]
pub struct HttpServer {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl HttpServer {
    /// Binds `address` and starts serving `app`
    pub async fn listen(app: Router, address: &str) -> Result<Self> {
        let listener: TcpListener = setup_listener(address).await?;
        Self::serve(app, listener)
    }

    /// Starts serving `app` on an already bound listener
    pub fn serve(app: Router, listener: TcpListener) -> Result<Self> {
        let local_addr: SocketAddr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // A dropped sender counts as a shutdown request too
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!("Server listening on: {}", local_addr);

        Ok(Self {
            local_addr,
            shutdown_tx,
            handle,
        })
    }
}

#[async_trait]
impl Listenable for HttpServer {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    async fn close(self) -> Result<()> {
        info!("Closing HTTP server on {}", self.local_addr);

        // Err only if the server task is already gone; the join below reports why
        let _ = self.shutdown_tx.send(());

        self.handle
            .await
            .context("HTTP server task panicked or was cancelled")?
            .context("HTTP server terminated with an error")?;

        info!("HTTP server closed");
        Ok(())
    }
}
