//! HTTP layer: axum router and handlers over the core services.
//!
//! Every route lives under `/api`. Handlers stay thin: extract, call into
//! [`crate::core`], wrap the result in JSON.

pub mod analytics;
pub mod cylinders;
pub mod data;
pub mod error;
pub mod extract;
pub mod logs;
pub mod settings;

use crate::errors::{Error, Result};
use axum::{Router, http::HeaderValue, routing::get};
use extract::Json;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
}

/// `{"message": ..}` body used by deletes and other confirmations
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"value": ..}` body used by the typed settings endpoints
#[derive(Debug, Serialize)]
pub struct ValueResponse<T> {
    pub value: T,
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Soda Tracker API"))
}

/// Builds the application router with request tracing.
pub fn router(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .nest("/logs", logs::routes())
        .nest("/cylinders", cylinders::routes())
        .nest("/analytics", analytics::routes())
        .nest("/settings", settings::routes())
        .nest("/data", data::routes());

    Router::new()
        .route("/", get(root))
        .nest("/api", api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(AppState { db })
}

/// CORS policy allowing browser calls from `origin`.
///
/// # Errors
/// [`Error::Config`] if `origin` is not a valid header value.
pub fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin: HeaderValue = origin.parse().map_err(|_| Error::Config {
        message: format!("Invalid CORS origin '{origin}'"),
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}
