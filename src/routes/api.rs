use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::core::SpeechEngine;
use crate::handlers::api;
use crate::state::AppState;
use std::sync::Arc;

/// Create the plain HTTP router
pub fn create_api_router<E: SpeechEngine>() -> Router<Arc<AppState<E>>> {
    Router::new()
        .route("/health", get(api::health_check))
        .layer(TraceLayer::new_for_http())
}
