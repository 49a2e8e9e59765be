//! HTTP surface: the question source endpoint plus the server-side cache.
//!
//! - `POST /api/trivia` generates `{count}` questions (default 5, at most 10)
//! - `GET /api/questions?count=n` serves from the prefetch buffer
//! - `GET /health` reports liveness and cache counters

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use crate::config::Config;
use crate::error::TriviaResult;
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use routes::{health_handler, questions_handler, trivia_handler};
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/trivia", post(trivia_handler))
        .route("/api/questions", get(questions_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Runs the server until Ctrl+C or SIGTERM.
pub async fn serve(config: Config) -> TriviaResult<()> {
    info!("Initializing state...");
    let state = AppState::from_config(config)?;
    if state.config.cache.warm_on_start {
        state.cache.init();
    }

    let address = state.config.server.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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
}
