//! HTTP Server
//!
//! Axum server with single-origin CORS, request tracing and graceful shutdown.

pub mod api;

pub use api::{api_router, ApiError, AppState, ErrorResponse, HealthResponse, TaskRequest};

use crate::agent::WorkflowConfig;
use crate::config::Config;
use crate::llm::ModelCaller;
use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Agent HTTP server
pub struct Server {
    config: Config,
    state: Arc<AppState>,
}

impl Server {
    /// Create a server running workflows against `model`
    pub fn new(config: Config, model: Arc<dyn ModelCaller>) -> Self {
        let workflow = WorkflowConfig {
            plan_fallback: config.plan_fallback,
        };
        Self {
            state: Arc::new(AppState::new(model, workflow)),
            config,
        }
    }

    /// Build the router with all routes and middleware
    pub fn build_router(&self) -> Result<Router> {
        let origin: HeaderValue = self
            .config
            .cors_origin
            .parse()
            .with_context(|| format!("Invalid CORS origin: {}", self.config.cors_origin))?;

        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(AllowHeaders::mirror_request());

        let mut router = api_router(self.state.clone()).layer(cors);

        if self.config.log_requests {
            router = router.layer(TraceLayer::new_for_http());
        }

        Ok(router)
    }

    /// Start the server and run until shutdown signal
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr();
        let router = self.build_router()?;

        info!("Starting agent server on {}", addr);
        info!("CORS origin: {}", self.config.cors_origin);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Agent server shut down gracefully");
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
