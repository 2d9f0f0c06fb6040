pub mod api;
pub mod ws;

use std::sync::Arc;

use axum::Router;

use crate::core::SpeechEngine;
use crate::state::AppState;

/// Assemble every route around the shared state.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// WebSocket handler logs the peer address.
pub fn create_router<E: SpeechEngine>(state: Arc<AppState<E>>) -> Router {
    Router::new()
        .merge(api::create_api_router())
        .merge(ws::create_ws_router())
        .with_state(state)
}
