//! Server-sent event stream of donation notifications.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderValue, Version};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;

use crate::state::AppState;

/// GET /api/stream
///
/// Registers the caller as a subscriber and streams its frames, starting
/// with a ping. The subscription is owned by the response body, so when the
/// client goes away the body is dropped and the subscriber is removed.
///
/// `Connection: keep-alive` is only meaningful on HTTP/1.x; HTTP/2 and later
/// forbid connection-specific headers.
pub async fn subscribe(State(state): State<AppState>, version: Version) -> Response {
    let subscription = state.registry.subscribe();
    let body = Body::from_stream(subscription.map(Ok::<_, Infallible>));

    let mut response = (
        [
            (CONTENT_TYPE, "text/event-stream"),
            (CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response();

    if version <= Version::HTTP_11 {
        response
            .headers_mut()
            .insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    }
    response
}
