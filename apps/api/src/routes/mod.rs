pub mod health;

use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};

use crate::screening::handlers;
use crate::state::AppState;

/// Uploads are capped at 10MB plus multipart framing overhead.
const BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/screening/process",
            post(handlers::handle_process),
        )
        .route(
            "/api/v1/screening/analyze",
            post(handlers::handle_analyze),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}
