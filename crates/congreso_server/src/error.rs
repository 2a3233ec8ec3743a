//! Maps `CongresoError` onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use congreso_core::error::CongresoError;

#[derive(Debug)]
pub struct AppError(pub CongresoError);

impl From<CongresoError> for AppError {
    fn from(err: CongresoError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let mut body = serde_json::json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        if let CongresoError::DuplicateKey(key) = &self.0 {
            body["key"] = serde_json::json!(key);
        }
        (status, Json(body)).into_response()
    }
}
