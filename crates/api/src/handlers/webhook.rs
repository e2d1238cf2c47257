//! Inbound processor notifications.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tipline_core::donation;
use tipline_core::error::VerificationError;
use tipline_core::signature::SIGNATURE_HEADER;

use crate::error::AppResult;
use crate::state::AppState;

/// POST /api/webhook
///
/// The body is taken as raw bytes: the signature covers the exact payload,
/// so it must not be parsed before verification. Verified events of kinds
/// with no subscriber-facing meaning are acknowledged and ignored.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let header = match headers.get(SIGNATURE_HEADER) {
        Some(value) => value.to_str().map_err(|_| VerificationError::MalformedHeader),
        None => Ok(""),
    };

    let event = match header.and_then(|header| state.verifier.verify(&body, header)) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, body_len = body.len(), "Webhook verification failed");
            return Err(e.into());
        }
    };

    match donation::translate(&event) {
        Some(message) => {
            let report = state.registry.broadcast(&message);
            tracing::info!(
                event_id = %event.id(),
                text = message.text(),
                delivered = report.delivered,
                failed = report.failed,
                "Donation broadcast"
            );
        }
        None => {
            tracing::debug!(
                event_id = %event.id(),
                kind = event.kind().as_str(),
                "Ignoring webhook event"
            );
        }
    }

    Ok(Json(json!({ "received": true })))
}
