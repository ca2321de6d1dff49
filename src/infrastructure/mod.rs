mod database;
pub mod logging;
pub mod metrics;

// Re-export the factory functions for easy access
pub use database::{
    connect_postgres, create_memory_repository, create_postgres_repository, MemoryRepository,
    PostgresRepository,
};
pub use logging::init_logging;
pub use metrics::{create_noop_metrics, create_prom_metrics};
