use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tripdesk_core::CoreError;

/// Success envelope: `{"data": .., "error": null}`.
pub fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "data": data, "error": null }))
}

#[derive(Debug)]
pub enum AppError {
    Core(CoreError),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Core(err) => {
                let status = match &err {
                    CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                    // Retry-on-conflict is a caller concern; make the lost
                    // race visible as a conflict.
                    CoreError::CapacityExceeded { .. } => StatusCode::CONFLICT,
                    CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    CoreError::Upstream(_) => StatusCode::FAILED_DEPENDENCY,
                    CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!("Internal error: {err}");
                    "Unexpected server error".to_string()
                } else {
                    err.to_string()
                };
                (status, err.code(), message)
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Unexpected server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "data": null,
            "error": { "code": code, "message": message },
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
