use axum::Json;
use serde_json::{Value, json};

/// Liveness probe
///
/// Returns `{"status": "OK"}` once the server is accepting connections.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}
