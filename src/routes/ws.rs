//! Recognition WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::core::SpeechEngine;
use crate::handlers::ws::ws_voice_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the recognition WebSocket router
///
/// # Endpoint
///
/// `GET /` - WebSocket upgrade for streaming recognition
///
/// # Protocol
///
/// After the upgrade, clients send:
/// 1. An optional `{"config": {...}}` message (sample rate, phrase list, model, words, alternatives)
/// 2. Binary audio frames (PCM 16-bit little-endian, mono)
/// 3. `{"eof" : 1}` to finish, or `{"reset" : 1}` to flush and continue
///
/// Every audio frame and control message gets exactly one JSON text response.
///
/// # Example
///
/// ```json
/// // Client sends config
/// {"config": {"sample_rate": 16000, "words": 1}}
///
/// // Client streams audio as binary frames, server replies with partials
/// {"partial": "what is the"}
///
/// // Client sends {"eof" : 1}, server replies with the final result and closes
/// {"result": [...], "text": "what is the time"}
/// ```
pub fn create_ws_router<E: SpeechEngine>() -> Router<Arc<AppState<E>>> {
    Router::new()
        .route("/", get(ws_voice_handler::<E>))
        .layer(TraceLayer::new_for_http())
}
