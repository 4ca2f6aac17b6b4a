pub mod chat;
pub mod health;

use axum::http::StatusCode;
use axum::Json;

use crate::error::Error;
use crate::models::ErrorBody;

/// Convert a pipeline error into the wire payload. The taxonomy survives
/// the boundary: callers can tell a not-ready service from a broken or
/// slow provider instead of seeing an opaque 500 for everything.
pub(crate) fn error_response(err: &Error) -> (StatusCode, Json<ErrorBody>) {
    let status = match err {
        Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        Error::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
        Error::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::Io(_) | Error::DimensionMismatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            code: err.code().to_string(),
            message: err.to_string(),
        }),
    )
}
