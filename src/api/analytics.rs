//! `/api/analytics` handlers. "Today" is the server's local date.

use super::{
    AppState,
    extract::{Json, Query},
};
use crate::{
    core::analytics::{self, Period},
    errors::Result,
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(report))
        .route("/dashboard", get(dashboard))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// General report, `?period=30d|90d|180d|365d` (default 30d)
pub async fn report(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse> {
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse()?,
        None => Period::default(),
    };
    let report = analytics::generate_report(&state.db, period, today()).await?;
    Ok((StatusCode::OK, Json(report)))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let summary = analytics::dashboard_summary(&state.db, today()).await?;
    Ok((StatusCode::OK, Json(summary)))
}
