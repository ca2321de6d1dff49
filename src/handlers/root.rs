use axum::Json;
use serde_json::{json, Value};

pub async fn root_handler() -> Json<Value> {
    // ---
    tracing::info!("Home page accessed");

    Json(json!({
        "message": "Welcome to the Axum observability demo",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health (add ?mode=full to check the item store)",
            "data": "GET /api/data",
            "error": "GET /error",
            "slow": "GET /slow",
            "metrics": "GET /metrics",
            "items": "GET|POST /api/items",
            "item": "GET|PUT|DELETE /api/items/{id}",
        }
    }))
}
