// handlers/public/mod.rs - no authentication required
//
// Paths served from here must also be listed in
// `middleware::policy::PUBLIC_ROUTES`, or the policy will demand a key.

use axum::Json;
use serde_json::{json, Value};

/// GET /health - liveness only; does not touch the task store
pub async fn health() -> Json<Value> {
    tracing::debug!("health check called");
    Json(json!({ "status": "UP" }))
}
