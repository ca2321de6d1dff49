// src/lib.rs
use anyhow::Result;
use app_state::AppState;
use axum::{
    routing::get,
    Router,
};

use handlers::*;

// Public exports (visible outside this module)
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod error;
mod handlers;
mod infrastructure;
mod middleware;

pub use config::*;
pub use domain::{ItemRepositoryPtr, MetricsPtr};
pub use error::{AppError, ErrorKind};
pub use handlers::PROMETHEUS_CONTENT_TYPE;
pub use middleware::{
    track_requests, InFlight, Instrumentation, RequestTimer, CLIENT_CLOSED_REQUEST, UNKNOWN_ROUTE,
};

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    connect_postgres, // ---
    create_memory_repository,
    create_noop_metrics,
    create_postgres_repository,
    create_prom_metrics,
    init_logging,
    MemoryRepository,
    PostgresRepository,
};
pub use infrastructure::logging::{
    Fields, LogFormat, LogOutput, StructuredLogger, TIMESTAMP_FORMAT,
};
pub use infrastructure::metrics::noop::NoopMetrics;
pub use infrastructure::metrics::prometheus::{
    register_http_metrics, MetricDesc, MetricKind, MetricRegistry, PrometheusMetrics,
    RegistryError, APP_ERRORS_TOTAL, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS,
    ITEMS_CREATED_TOTAL,
};

/// Build the HTTP router with every backend determined by environment variables.
pub async fn create_router() -> Result<Router> {
    // ---
    let config = AppConfig::from_env()?;
    create_router_with_config(&config).await
}

/// Build the HTTP router from an explicit configuration.
///
/// Registration of the service metrics happens here, so invalid histogram
/// buckets fail startup instead of surfacing at request time.
pub async fn create_router_with_config(config: &AppConfig) -> Result<Router> {
    // ---
    let metrics = match config.metrics.backend {
        MetricsBackend::Prometheus => create_prom_metrics(&config.metrics.duration_buckets)?,
        MetricsBackend::Noop => create_noop_metrics()?,
    };

    let repository = match &config.storage {
        StorageConfig::Memory => create_memory_repository(),
        StorageConfig::Postgres(database) => create_postgres_repository(database).await?,
    };

    Ok(build_router(metrics, repository, config.demo.clone()))
}

/// Assemble the router around already constructed backends.
///
/// The instrumentation layer is added last so it wraps every route and the
/// fallback.
pub fn build_router(
    metrics: MetricsPtr,
    repository: ItemRepositoryPtr,
    demo: DemoConfig,
) -> Router {
    // ---
    let instrumentation = Instrumentation::new(metrics.clone());
    let app_state = AppState::new(metrics, repository, demo);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/data", get(get_data))
        .route("/error", get(simulate_error))
        .route("/slow", get(slow_endpoint))
        .route("/api/items", get(list_items).post(create_item))
        .route(
            "/api/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            instrumentation,
            track_requests,
        ))
        .with_state(app_state)
}
