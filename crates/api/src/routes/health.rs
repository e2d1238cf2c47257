use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Liveness body returned by `GET /`.
pub const HEALTH_BODY: &str = "tipline backend OK";

async fn health_check() -> &'static str {
    HEALTH_BODY
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
