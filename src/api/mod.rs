//! Safar REST API
//!
//! HTTP API layer for Safar, built with Axum.
//!
//! # Endpoints
//!
//! ## Feed
//! - `GET /api/v1/topics` - Active feed topics
//! - `GET /api/v1/articles` - All articles, newest first
//! - `POST /api/v1/articles` - Submit an article (login required)
//! - `GET /api/v1/articles/:id` - Read an article (login required)
//!
//! ## Chat
//! - `GET /api/v1/chat/messages` - Recent history (login required)
//! - `POST /api/v1/chat/messages` - Send a message (login required)
//!
//! ## Analytics
//! - `GET /api/v1/analytics/seasons` - Seasons in the dataset
//! - `GET /api/v1/analytics/:report` - overview, industries, insights, trends, startups
//!
//! ## Session
//! - `GET /api/v1/auth/me` - Profile behind the bearer token
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Live insert notifications
//!
//! # Example
//!
//! ```rust,ignore
//! use safar::analytics::Dataset;
//! use safar::api::{serve, AppState};
//! use safar::config::Config;
//! use safar::store::DataStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(DataStore::in_memory()?);
//!     let dataset = Arc::new(Dataset::sample());
//!
//!     let state = AppState::from_config(store, dataset, &config);
//!     serve(state, &config.api).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{CurrentUser, RequireUser};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Feed routes
        .route("/topics", get(routes::feed::list_topics))
        .route(
            "/articles",
            get(routes::feed::list_articles).post(routes::feed::create_article),
        )
        .route("/articles/:id", get(routes::feed::get_article))
        // Chat routes
        .route(
            "/chat/messages",
            get(routes::chat::list_messages).post(routes::chat::send_message),
        )
        // Analytics routes
        .route("/analytics/seasons", get(routes::analytics::list_seasons))
        .route("/analytics/:report", get(routes::analytics::run_report))
        // Session
        .route("/auth/me", get(routes::auth::me))
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout = TimeoutLayer::new(Duration::from_secs(state.config.request_timeout_secs));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Safar API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Safar API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
