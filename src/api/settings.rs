//! `/api/settings` handlers: the generic key/value store plus typed shortcuts
//! for the values the rest of the app reads.

use super::{
    AppState, MessageResponse, ValueResponse,
    extract::{Json, Path, Query},
};
use crate::{core::settings, errors::Result};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NewSetting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct SettingValue {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct CostQuery {
    pub cost: f64,
}

#[derive(Debug, Deserialize)]
pub struct PushesQuery {
    pub pushes: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_settings).post(create_setting))
        .route(
            "/{key}",
            get(get_setting).put(put_setting).delete(delete_setting),
        )
        .route(
            "/retail-price/current",
            get(get_retail_price).put(put_retail_price),
        )
        .route(
            "/initial-cost/current",
            get(get_initial_cost).put(put_initial_cost),
        )
        .route(
            "/default-pushes-1l/current",
            get(get_pushes_1l).put(put_pushes_1l),
        )
        .route(
            "/default-pushes-05l/current",
            get(get_pushes_05l).put(put_pushes_05l),
        )
}

pub async fn list_settings(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let all = settings::get_all_settings(&state.db).await?;
    Ok((StatusCode::OK, Json(all)))
}

pub async fn create_setting(
    State(state): State<AppState>,
    Json(new_setting): Json<NewSetting>,
) -> Result<impl IntoResponse> {
    let created = settings::create_setting(&state.db, new_setting.key, new_setting.value).await?;
    Ok((StatusCode::OK, Json(created)))
}

pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse> {
    let setting = settings::get_setting(&state.db, &key).await?;
    Ok((StatusCode::OK, Json(setting)))
}

/// Creates the key if it does not exist yet
pub async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<SettingValue>,
) -> Result<impl IntoResponse> {
    let setting = settings::upsert_setting(&state.db, &key, body.value).await?;
    Ok((StatusCode::OK, Json(setting)))
}

pub async fn delete_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse> {
    settings::delete_setting(&state.db, &key).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Setting deleted successfully")),
    ))
}

pub async fn get_retail_price(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let value = settings::get_retail_price(&state.db).await?;
    Ok((StatusCode::OK, Json(ValueResponse { value })))
}

pub async fn put_retail_price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> Result<impl IntoResponse> {
    let value = settings::set_retail_price(&state.db, query.price).await?;
    Ok((StatusCode::OK, Json(ValueResponse { value })))
}

pub async fn get_initial_cost(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let value = settings::get_initial_cost(&state.db).await?;
    Ok((StatusCode::OK, Json(ValueResponse { value })))
}

pub async fn put_initial_cost(
    State(state): State<AppState>,
    Query(query): Query<CostQuery>,
) -> Result<impl IntoResponse> {
    let value = settings::set_initial_cost(&state.db, query.cost).await?;
    Ok((StatusCode::OK, Json(ValueResponse { value })))
}

pub async fn get_pushes_1l(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let value = settings::get_default_pushes_1l(&state.db).await?;
    Ok((StatusCode::OK, Json(ValueResponse { value })))
}

pub async fn put_pushes_1l(
    State(state): State<AppState>,
    Query(query): Query<PushesQuery>,
) -> Result<impl IntoResponse> {
    let value = settings::set_default_pushes_1l(&state.db, query.pushes).await?;
    Ok((StatusCode::OK, Json(ValueResponse { value })))
}

pub async fn get_pushes_05l(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let value = settings::get_default_pushes_05l(&state.db).await?;
    Ok((StatusCode::OK, Json(ValueResponse { value })))
}

pub async fn put_pushes_05l(
    State(state): State<AppState>,
    Query(query): Query<PushesQuery>,
) -> Result<impl IntoResponse> {
    let value = settings::set_default_pushes_05l(&state.db, query.pushes).await?;
    Ok((StatusCode::OK, Json(ValueResponse { value })))
}
