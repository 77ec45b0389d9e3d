//! HTTP error mapping
//!
//! Every operation failure surfaces as one of the domain error kinds; this
//! module maps each kind to a status code. Internal detail for server-side
//! failures is logged, never echoed to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use careslot_domain::CareslotError;
use serde_json::json;
use tracing::{error, warn};

/// Wrapper turning domain errors into HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub CareslotError);

impl From<CareslotError> for ApiError {
    fn from(value: CareslotError) -> Self {
        Self(value)
    }
}

/// Convert a `CareslotError` into a stable label suitable for responses and
/// logging.
#[inline]
pub fn error_label(error: &CareslotError) -> &'static str {
    match error {
        CareslotError::Config(_) => "config",
        CareslotError::Database(_) => "database",
        CareslotError::Upstream(_) => "upstream_unavailable",
        CareslotError::Unauthenticated(_) => "unauthenticated",
        CareslotError::NotFound(_) => "not_found",
        CareslotError::Conflict(_) => "conflict",
        CareslotError::InvalidInput(_) => "invalid_input",
        CareslotError::Internal(_) => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CareslotError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            CareslotError::NotFound(_) => StatusCode::NOT_FOUND,
            CareslotError::Conflict(_) => StatusCode::CONFLICT,
            CareslotError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CareslotError::Upstream(_) | CareslotError::Database(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CareslotError::Config(_) | CareslotError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let label = error_label(&self.0);

        let message = if status.is_server_error() {
            error!(error = %self.0, label, "request failed");
            "service temporarily unavailable".to_string()
        } else {
            warn!(error = %self.0, label, "request rejected");
            self.0.to_string()
        };

        (status, Json(json!({ "error": label, "message": message }))).into_response()
    }
}
