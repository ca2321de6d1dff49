//! Prometheus metrics implementation.
//!
//! This module provides a concrete implementation of the `Metrics` trait on
//! top of an owned [`MetricRegistry`]. The registry is created once per
//! router, so independent routers (and tests) never share counters.
//!
//! Recording failures are programmer errors (an unregistered name or a label
//! arity mismatch). They are logged at error level and the update is dropped,
//! so a metrics bug can never fail the request being measured.

use super::registry::{MetricRegistry, RegistryError};
use crate::domain::Metrics;
use std::sync::Arc;

/// Prometheus-based metrics implementation.
pub struct PrometheusMetrics {
    registry: Arc<MetricRegistry>,
}

impl PrometheusMetrics {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        tracing::info!("Creating Prometheus metrics");
        PrometheusMetrics { registry }
    }

    /// Shared handle to the underlying registry.
    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }
}

fn log_and_drop(result: Result<(), RegistryError>) {
    // ---
    if let Err(err) = result {
        tracing::error!(error = %err, "Dropping metric update");
    }
}

impl Metrics for PrometheusMetrics {
    fn render(&self) -> String {
        self.registry.export()
    }

    fn record_http_request(&self, method: &str, route: &str, status: u16, elapsed_secs: f64) {
        log_and_drop(super::track_http_request(
            &self.registry,
            method,
            route,
            status,
            elapsed_secs,
        ));
    }

    fn record_app_error(&self, error_type: &str) {
        tracing::debug!(error_type, "Recording application error");
        log_and_drop(super::increment_app_error(&self.registry, error_type));
    }

    fn record_item_created(&self) {
        tracing::debug!("Recording item created event");
        log_and_drop(super::increment_item_created(&self.registry));
    }
}
