use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct HealthQuery {
    mode: Option<String>,
}

/// Responds with the health status of the server.
///
/// - By default (no query parameters), performs a light check to confirm the web server
///   is running.
///
/// - If `mode=full` is passed as a query parameter, also asks the item store
///   to prove it is reachable.
///
/// # Query Parameters
/// - `mode`: Optional. Accepts `"light"` (default) or `"full"`.
///
/// # Responses
/// - `200 OK` with `{ "status": "healthy", "timestamp": ... }` if the server (and store,
///   in full mode) are healthy.
/// - `500 INTERNAL SERVER ERROR` with `{ "status": "unhealthy", ... }` if the store check fails.
pub async fn health_check(
    State(state): State<AppState>,
    Query(params): Query<HealthQuery>,
) -> (StatusCode, Json<HealthResponse>) {
    // ---
    if params.mode.as_deref() == Some("full") {
        if let Err(err) = state.repository().health_check().await {
            tracing::error!(error = ?err, "Item store health check failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, respond("unhealthy"));
        }
    }

    (StatusCode::OK, respond("healthy"))
}

fn respond(status: &'static str) -> Json<HealthResponse> {
    Json(HealthResponse {
        status,
        timestamp: Utc::now(),
    })
}
