//! HTTP API over the link store and checker.
//!
//! - `POST /api/check`: save links and queue them for checking
//! - `GET /api/status/:id`: current status of a link set
//! - `POST /api/report`: PDF report for a list of sets
//! - `GET /health`: liveness probe

pub mod handlers;
pub mod models;

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{AppError, Result};
use crate::services::LinkChecker;
use crate::storage::LinkStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LinkStore>,
    pub checker: Arc<LinkChecker>,
}

impl AppState {
    pub fn new(store: Arc<dyn LinkStore>, checker: Arc<LinkChecker>) -> Self {
        Self { store, checker }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-requested-with"),
        ]);

    Router::new()
        .route("/api/check", post(handlers::check_links))
        .route("/api/report", post(handlers::get_report))
        .route("/api/status/:id", get(handlers::get_status))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("Starting server on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound { .. } | AppError::LinkNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
