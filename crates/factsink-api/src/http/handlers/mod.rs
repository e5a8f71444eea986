//! HTTP request handlers.

pub mod sns;

use axum::Json;

/// GET /health - Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true, "version": env!("CARGO_PKG_VERSION") }))
}
