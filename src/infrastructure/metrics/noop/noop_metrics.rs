use crate::domain::Metrics;

/// No-op metrics implementation for testing.
pub struct NoopMetrics;

impl NoopMetrics {
    pub fn new() -> Self {
        NoopMetrics
    }
}

impl Metrics for NoopMetrics {
    // ---
    fn render(&self) -> String {
        String::new()
    }
    fn record_http_request(&self, _: &str, _: &str, _: u16, _: f64) {}
    fn record_app_error(&self, _: &str) {}
    fn record_item_created(&self) {}
}
