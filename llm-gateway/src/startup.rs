//! Application startup and lifecycle management.
//!
//! Builds the inference backend from configuration, binds the HTTP listener
//! and serves the router until a shutdown signal arrives.

use crate::config::{BackendKind, GatewayConfig};
use crate::handlers::{self, health_check, predict};
use crate::services::backends::{mock::MockBackend, vertex::VertexBackend, InferenceBackend};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::Level;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn InferenceBackend>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .route("/metrics", get(handlers::metrics::metrics))
        .fallback(handlers::not_found)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                })
                // Handlers log the inference outcome themselves.
                .on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Construct the backend selected by configuration.
pub fn build_backend(config: &GatewayConfig) -> Result<Arc<dyn InferenceBackend>, AppError> {
    let backend: Arc<dyn InferenceBackend> = match config.backend.kind {
        BackendKind::Vertex => {
            let vertex = VertexBackend::new(&config.backend)
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
            tracing::info!(
                project_id = %config.backend.project_id,
                region = %config.backend.region,
                endpoint_id = %config.backend.endpoint_id,
                static_token = config.backend.access_token.is_some(),
                "Initialized Vertex AI backend"
            );
            Arc::new(vertex)
        }
        BackendKind::Mock => {
            tracing::warn!("Using mock inference backend");
            Arc::new(MockBackend::echo())
        }
    };

    Ok(backend)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the backend chosen by `config`.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let backend = build_backend(&config)?;
        Self::build_with_backend(config, backend).await
    }

    /// Build the application around an already constructed backend.
    pub async fn build_with_backend(
        config: GatewayConfig,
        backend: Arc<dyn InferenceBackend>,
    ) -> Result<Self, AppError> {
        // Port 0 picks a random port, which tests rely on.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("LLM gateway listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state: AppState { backend },
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM, then drain in-flight requests.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
