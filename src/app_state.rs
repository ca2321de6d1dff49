//! Application state management.
//!
//! This module defines the shared state structure that gets passed to all
//! Axum handlers via the `State` extractor. The `AppState` contains shared
//! resources like the metrics backend, the item repository, and demo
//! endpoint settings.
//!
//! The state is designed to be cheaply cloneable (using `Arc` internally
//! where needed) so it can be passed efficiently to each request handler
//! without expensive copying of resources.

use crate::config::DemoConfig;
use crate::domain::{ItemRepositoryPtr, MetricsPtr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared application state passed to all Axum handlers and to the
/// instrumentation middleware.
///
/// # Lifecycle
///
/// 1. Created once in `create_router()` during application startup
/// 2. Attached to the Axum router via `.with_state(app_state)`
/// 3. Cloned automatically by Axum for each incoming HTTP request
/// 4. Handlers extract via `State(state): State<AppState>`
#[derive(Clone)]
pub(crate) struct AppState {
    /// Metrics implementation for recording application events.
    ///
    /// Either Prometheus-backed (production) or no-op (testing/development).
    metrics: MetricsPtr,

    /// Repository abstraction for item storage.
    repository: ItemRepositoryPtr,

    /// Simulated latency settings for `/api/data` and `/slow`.
    demo: Arc<DemoConfig>,

    /// Sequence number handed out by `/api/data`.
    data_requests: Arc<AtomicU64>,
}

impl AppState {
    // ---

    pub fn new(metrics: MetricsPtr, repository: ItemRepositoryPtr, demo: DemoConfig) -> Self {
        // ---
        AppState {
            metrics,
            repository,
            demo: Arc::new(demo),
            data_requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }

    /// Get a reference to the repository implementation.
    pub(crate) fn repository(&self) -> &ItemRepositoryPtr {
        // ---
        &self.repository
    }

    /// Get the demo endpoint settings.
    pub(crate) fn demo(&self) -> &DemoConfig {
        // ---
        &self.demo
    }

    /// Returns the next `/api/data` sequence number, starting at 1.
    pub(crate) fn next_data_id(&self) -> u64 {
        // ---
        self.data_requests.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    // ---

    use super::*;
    use crate::infrastructure::{create_memory_repository, create_noop_metrics};

    #[test]
    fn test_app_state_creation_and_clone() {
        // ---
        let metrics = create_noop_metrics().unwrap();
        let repository = create_memory_repository();

        let app_state = AppState::new(metrics, repository, DemoConfig::default());
        let cloned = app_state.clone();

        // Verify accessors work
        let _metrics_ref = app_state.metrics();
        let _repo_ref = app_state.repository();
        assert_eq!(app_state.demo().data_delay, DemoConfig::default().data_delay);

        // Clones share the data sequence
        assert_eq!(app_state.next_data_id(), 1);
        assert_eq!(cloned.next_data_id(), 2);
    }
}
