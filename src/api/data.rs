//! `/api/data` handlers: CSV import, export and the import template.

use super::{AppState, extract::Json};
use crate::{
    core::import_export::{
        self, EXPORT_FILENAME, SAMPLE_FILENAME, ensure_csv_upload,
    },
    errors::{Error, Result},
};
use axum::{
    Router,
    extract::{Multipart, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

/// Multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/import", post(import))
        .route("/export", get(export))
        .route("/sample-csv", get(sample_csv))
}

fn upload_error(e: &MultipartError) -> Error {
    Error::CsvFormat {
        message: format!("Error processing CSV: {}", e.body_text()),
    }
}

fn csv_attachment(filename: &str, body: Vec<u8>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    )
}

/// Imports the CSV sent in the `file` multipart field
pub async fn import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await.map_err(|e| upload_error(&e))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        ensure_csv_upload(field.file_name())?;
        let data = field.bytes().await.map_err(|e| upload_error(&e))?;
        let summary = import_export::import_csv(&state.db, &data).await?;
        return Ok((StatusCode::OK, Json(summary)));
    }

    Err(Error::CsvFormat {
        message: "No file uploaded".to_string(),
    })
}

pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = import_export::export_csv(&state.db).await?;
    Ok(csv_attachment(EXPORT_FILENAME, body))
}

pub async fn sample_csv() -> Result<impl IntoResponse> {
    let body = import_export::sample_csv()?;
    Ok(csv_attachment(SAMPLE_FILENAME, body))
}
