//! `GET /api/v1/health`: liveness probe for load balancers and containers.

use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}
