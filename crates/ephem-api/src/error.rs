use ephem_core::{EmitError, ReapError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("reap failed: {0}")]
    Reap(#[from] ReapError),
    #[error("event not accepted: {0}")]
    Dispatch(#[from] EmitError),
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            ApiError::InvalidRequest(_) | ApiError::Reap(ReapError::InvalidTrigger(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Reap(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Dispatch(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        tracing::warn!(status = status.as_u16(), error = %self, "request failed");

        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
