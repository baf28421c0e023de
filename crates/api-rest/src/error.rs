//! Mapping from service failures to HTTP responses.

use api_shared::wire::NOT_FOUND_MESSAGE;
use api_shared::{ErrorRes, MessageRes};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ehr_core::RecordError;

/// API-level errors with HTTP status mapping.
///
/// Validation and store failures share the 500 `{error}` shape; only NotFound and
/// unreadable bodies get their own status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No record found")]
    NotFound,
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error(transparent)]
    Record(RecordError),
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound
        } else {
            ApiError::Record(err)
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON whose fields have the wrong shape fails like validation does.
            JsonRejection::JsonDataError(err) => ApiError::Unprocessable(err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(MessageRes::new(NOT_FOUND_MESSAGE)),
            )
                .into_response(),
            ApiError::BadRequest(_) => {
                tracing::warn!(error = %self, "rejected request body");
                (StatusCode::BAD_REQUEST, Json(ErrorRes::new(self.to_string()))).into_response()
            }
            ApiError::Unprocessable(_) | ApiError::Record(_) => {
                tracing::error!(error = %self, "EHR request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorRes::new(self.to_string())),
                )
                    .into_response()
            }
        }
    }
}
