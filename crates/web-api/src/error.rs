use abtest_experiments::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Analysis capacity unavailable")]
    Unavailable,
    #[error("Analysis task failed: {0}")]
    Internal(String),
}

/// Converts `ApiError` into an HTTP response with a JSON `error` body.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(err) => {
                tracing::debug!(error = %err, "Rejected invalid request");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::InvalidBody(message) => {
                tracing::debug!(error = %message, "Rejected malformed body");
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::Unavailable => {
                tracing::error!("Analysis semaphore closed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Analysis capacity unavailable".to_string(),
                )
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Analysis task failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred during analysis".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
