pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /webhook     processor notifications (POST, signed)
/// /stream      server-sent event stream (GET)
/// /checkout    create a donation checkout session (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(handlers::webhook::receive))
        .route("/stream", get(handlers::stream::subscribe))
        .route("/checkout", post(handlers::checkout::create))
}
