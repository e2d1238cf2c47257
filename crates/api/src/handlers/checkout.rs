//! Donation checkout session creation.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tipline_core::error::SessionCreationError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for `POST /api/checkout`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutInput {
    /// Free-text annotation shown to the streamer. Sanitized before use.
    /// Must be a JSON string or `null`; numbers and other types are a 400.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// POST /api/checkout
///
/// An empty body is the same as `{}`. The processor call is bounded by
/// `checkout_timeout`, which is shorter than the router's header timeout,
/// so a stalled processor still answers with `checkout_failed`.
pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<CheckoutResponse>> {
    let input = parse_input(&body)?;
    let request = state
        .checkout
        .build(input.message.as_deref().unwrap_or_default());

    let timeout = state.config.checkout_timeout();
    let session = tokio::time::timeout(timeout, state.gateway.create_session(&request))
        .await
        .map_err(|_| {
            SessionCreationError::Transport(format!(
                "no response from payment processor within {}s",
                timeout.as_secs()
            ))
        })??;
    tracing::info!(session_id = %session.id, "Checkout session created");

    Ok(Json(CheckoutResponse { url: session.url }))
}

fn parse_input(body: &[u8]) -> AppResult<CheckoutInput> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CheckoutInput::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}
