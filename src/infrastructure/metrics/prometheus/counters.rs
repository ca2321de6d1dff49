use super::registry::{MetricDesc, MetricRegistry, RegistryError};

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const APP_ERRORS_TOTAL: &str = "app_errors_total";
pub const ITEMS_CREATED_TOTAL: &str = "items_created_total";

/// Register the request, latency, error and item counters used by the service.
pub fn register_http_metrics(
    registry: &MetricRegistry,
    duration_buckets: &[f64],
) -> Result<(), RegistryError> {
    // ---
    registry.register(MetricDesc::counter(
        HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests",
        &["method", "route", "status"],
    ))?;
    registry.register(MetricDesc::histogram(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds",
        &["method", "route"],
        duration_buckets,
    ))?;
    registry.register(MetricDesc::counter(
        APP_ERRORS_TOTAL,
        "Total number of application errors",
        &["error_type"],
    ))?;
    registry.register(MetricDesc::counter(
        ITEMS_CREATED_TOTAL,
        "Total number of items created",
        &[],
    ))?;
    Ok(())
}

/// Count a finished request and record its latency.
pub fn track_http_request(
    registry: &MetricRegistry,
    method: &str,
    route: &str,
    status: u16,
    elapsed_secs: f64,
) -> Result<(), RegistryError> {
    // ---
    let status = status.to_string();
    registry.increment(HTTP_REQUESTS_TOTAL, &[method, route, &status])?;
    registry.observe(HTTP_REQUEST_DURATION_SECONDS, &[method, route], elapsed_secs)
}

/// Increment the application error counter for `error_type`.
pub fn increment_app_error(
    registry: &MetricRegistry,
    error_type: &str,
) -> Result<(), RegistryError> {
    registry.increment(APP_ERRORS_TOTAL, &[error_type])
}

/// Increment the counter for created items.
pub fn increment_item_created(registry: &MetricRegistry) -> Result<(), RegistryError> {
    registry.increment(ITEMS_CREATED_TOTAL, &[])
}
