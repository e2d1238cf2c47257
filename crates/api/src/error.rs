use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tipline_core::error::{SessionCreationError, VerificationError};

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`]. Webhook rejections answer in plain text, the
/// other variants as a JSON `{"error": ...}` object.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An inbound notification failed verification.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The processor could not open a checkout session.
    #[error(transparent)]
    Checkout(#[from] SessionCreationError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Verification(err) => {
                (StatusCode::BAD_REQUEST, format!("Webhook Error: {err}")).into_response()
            }
            AppError::Checkout(err) => {
                // The cause stays server-side.
                tracing::error!(error = %err, "Checkout session creation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({ "error": "checkout_failed" })),
                )
                    .into_response()
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, axum::Json(json!({ "error": msg }))).into_response()
            }
        }
    }
}
