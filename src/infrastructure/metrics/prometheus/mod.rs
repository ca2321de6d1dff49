mod counters;
mod prometheus_metrics;
mod registry;

pub use prometheus_metrics::PrometheusMetrics;
pub use registry::{MetricDesc, MetricKind, MetricRegistry, RegistryError};
use std::sync::Arc;

// Re-export utilities for internal use within this module
pub(crate) use counters::{increment_app_error, increment_item_created, track_http_request};
pub use counters::{
    register_http_metrics, APP_ERRORS_TOTAL, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS,
    ITEMS_CREATED_TOTAL,
};

/// Creates a new Prometheus metrics implementation.
///
/// Builds a fresh [`MetricRegistry`], registers the service metrics with the
/// given latency buckets, and wraps it for use through `MetricsPtr`.
///
/// # Errors
/// Fails if the bucket bounds are invalid.
pub fn create(duration_buckets: &[f64]) -> anyhow::Result<crate::domain::MetricsPtr> {
    tracing::info!("Initializing Prometheus metrics");
    let registry = Arc::new(MetricRegistry::new());
    register_http_metrics(&registry, duration_buckets)?;

    Ok(Arc::new(PrometheusMetrics::new(registry)))
}
