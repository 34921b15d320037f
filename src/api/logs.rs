//! `/api/logs` handlers.

use super::{
    AppState, MessageResponse,
    extract::{Json, Path, Query},
};
use crate::{
    core::consumption_log::{self, DEFAULT_PAGE_LIMIT, LogUpdate, NewLog},
    errors::Result,
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_logs).post(create_log))
        .route("/{id}", get(get_log).put(update_log).delete(delete_log))
}

/// List logs handler
pub async fn list_logs(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse> {
    let logs = consumption_log::list_logs(&state.db, page.skip, page.limit).await?;
    Ok((StatusCode::OK, Json(logs)))
}

/// Create log handler
pub async fn create_log(
    State(state): State<AppState>,
    Json(new_log): Json<NewLog>,
) -> Result<impl IntoResponse> {
    let created = consumption_log::create_log(&state.db, new_log).await?;
    Ok((StatusCode::OK, Json(created)))
}

/// Get log by ID handler
pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let log = consumption_log::get_log(&state.db, id).await?;
    Ok((StatusCode::OK, Json(log)))
}

/// Partial update handler
pub async fn update_log(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(changes): Json<LogUpdate>,
) -> Result<impl IntoResponse> {
    let updated = consumption_log::update_log(&state.db, id, changes).await?;
    Ok((StatusCode::OK, Json(updated)))
}

/// Delete log handler
pub async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    consumption_log::delete_log(&state.db, id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Log deleted successfully")),
    ))
}
