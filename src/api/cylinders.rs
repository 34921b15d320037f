//! `/api/cylinders` handlers.

use super::{
    AppState, MessageResponse,
    extract::{Json, Path, Query},
};
use crate::{
    core::cylinder::{self, CylinderUpdate, NewCylinder},
    errors::Result,
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ChangeActiveQuery {
    pub new_cylinder_id: i32,
}

#[derive(Debug, Serialize)]
pub struct TotalPushesResponse {
    pub total_pushes: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cylinders).post(create_cylinder))
        .route("/change-active", post(change_active))
        .route(
            "/{id}",
            get(get_cylinder).put(update_cylinder).delete(delete_cylinder),
        )
        .route("/{id}/date-range", get(date_range))
        .route("/{id}/total-pushes", get(total_pushes))
}

pub async fn list_cylinders(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let cylinders = cylinder::get_all_cylinders(&state.db).await?;
    Ok((StatusCode::OK, Json(cylinders)))
}

pub async fn create_cylinder(
    State(state): State<AppState>,
    Json(new_cylinder): Json<NewCylinder>,
) -> Result<impl IntoResponse> {
    let created = cylinder::create_cylinder(&state.db, new_cylinder).await?;
    Ok((StatusCode::OK, Json(created)))
}

pub async fn get_cylinder(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let found = cylinder::get_cylinder_by_id(&state.db, id).await?;
    Ok((StatusCode::OK, Json(found)))
}

pub async fn update_cylinder(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(changes): Json<CylinderUpdate>,
) -> Result<impl IntoResponse> {
    let updated = cylinder::update_cylinder(&state.db, id, changes).await?;
    Ok((StatusCode::OK, Json(updated)))
}

/// Refuses while logs still reference the cylinder
pub async fn delete_cylinder(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    cylinder::delete_cylinder(&state.db, id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Cylinder deleted successfully")),
    ))
}

pub async fn change_active(
    State(state): State<AppState>,
    Query(query): Query<ChangeActiveQuery>,
) -> Result<impl IntoResponse> {
    let active = cylinder::change_active_cylinder(&state.db, query.new_cylinder_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(format!(
            "Cylinder #{} is now active",
            active.number
        ))),
    ))
}

pub async fn date_range(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let range = cylinder::get_cylinder_date_range(&state.db, id).await?;
    Ok((StatusCode::OK, Json(range)))
}

pub async fn total_pushes(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let total_pushes = cylinder::get_cylinder_total_pushes(&state.db, id).await?;
    Ok((
        StatusCode::OK,
        Json(TotalPushesResponse { total_pushes }),
    ))
}
