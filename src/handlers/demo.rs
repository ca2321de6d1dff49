//! Demo endpoints that produce interesting telemetry: variable latency,
//! deliberate failures and slow responses.

use crate::config::DelayRange;
use crate::error::AppError;
use crate::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct DataPoint {
    id: u64,
    value: u32,
    timestamp: DateTime<Utc>,
}

/// Sleeps for a random duration within `range` and returns it.
async fn simulate_latency(range: DelayRange) -> Duration {
    // ---
    let delay = if range.max.is_zero() {
        Duration::ZERO
    } else {
        rand::thread_rng().gen_range(range.min..=range.max)
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    delay
}

/// `GET /api/data`: a random data point after a short simulated delay.
pub async fn get_data(State(state): State<AppState>) -> Json<DataPoint> {
    // ---
    simulate_latency(state.demo().data_delay).await;

    let point = DataPoint {
        id: state.next_data_id(),
        value: rand::thread_rng().gen_range(1..=100),
        timestamp: Utc::now(),
    };
    tracing::info!(data_id = point.id, value = point.value, "Data generated");

    Json(point)
}

/// `GET /error`: always fails with a 500.
pub async fn simulate_error() -> Result<Json<Value>, AppError> {
    // ---
    tracing::error!("Simulated error triggered");
    Err(AppError::Simulated)
}

/// `GET /slow`: answers after a long simulated delay.
pub async fn slow_endpoint(State(state): State<AppState>) -> Json<Value> {
    // ---
    let delay = simulate_latency(state.demo().slow_delay).await;
    tracing::warn!(delay_ms = delay.as_millis() as u64, "Slow endpoint accessed");

    Json(json!({
        "message": "Slow response",
        "delay_seconds": delay.as_secs_f64(),
    }))
}

/// Fallback for unmatched paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not found")
}
