use std::sync::Arc;

/// Abstraction for application metrics (counters, histograms).
///
/// Implementations must never fail the caller: recording problems are
/// logged and dropped inside the backend.
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record one finished HTTP request.
    ///
    /// `route` is the matched route template (or `"unknown"`), never a raw path.
    fn record_http_request(&self, method: &str, route: &str, status: u16, elapsed_secs: f64);

    /// Record an application error of the given kind.
    fn record_app_error(&self, error_type: &str);

    /// Record an "item created" event.
    fn record_item_created(&self);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
