//! Maps crate errors onto HTTP responses.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Error body, `{"detail": "<message>"}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl Error {
    /// Status code this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::CylinderNotFound { .. } | Self::LogNotFound { .. } | Self::SettingNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::DuplicateCylinder { .. }
            | Self::DuplicateSetting { .. }
            | Self::CylinderInUse { .. }
            | Self::InvalidBottleSize { .. }
            | Self::InvalidInput { .. }
            | Self::CsvFormat { .. } => StatusCode::BAD_REQUEST,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::Csv(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, "Request rejected");
            self.to_string()
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::LogNotFound { id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::DuplicateCylinder { number: 1 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::invalid_input("nope").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
