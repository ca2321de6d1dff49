// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

/// Reads an optional environment variable through a parser function
/// returning `Option<T>`, falling back to `$default` on absence or failure.
macro_rules! optional_env_with {
    // ---
    ($key:literal, $parser:expr, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| $parser(&v))
            .unwrap_or_else(|| $default)
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
/// All required configuration is validated eagerly during initialization.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: server::ServerConfig,
    pub logging: logging::LoggingConfig,
    pub metrics: metrics::MetricsConfig,
    pub storage: storage::StorageConfig,
    pub demo: demo::DemoConfig,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            server: server::ServerConfig::from_env(),
            logging: logging::LoggingConfig::from_env(),
            metrics: metrics::MetricsConfig::from_env(),
            storage: storage::StorageConfig::from_env()?,
            demo: demo::DemoConfig::from_env(),
        })
    }
}

/// Parses `"min-max"` into a millisecond range. A single number means a fixed delay.
fn parse_delay_range(raw: &str) -> Option<DelayRange> {
    // ---
    let (min, max) = match raw.split_once('-') {
        Some((min, max)) => (min.trim().parse().ok()?, max.trim().parse().ok()?),
        None => {
            let fixed = raw.trim().parse().ok()?;
            (fixed, fixed)
        }
    };
    (min <= max).then(|| DelayRange::from_millis(min, max))
}

/// Inclusive range of simulated latencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    // ---
    pub const fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    pub const fn none() -> Self {
        Self::from_millis(0, 0)
    }
}

// ============================================================
// Server configuration
// ============================================================

mod server {
    // ---

    /// HTTP listener configuration.
    #[derive(Debug, Clone)]
    pub struct ServerConfig {
        /// Socket address to bind. Defaults to `127.0.0.1:8080`.
        pub bind_addr: String,
    }

    impl Default for ServerConfig {
        fn default() -> Self {
            Self {
                bind_addr: "127.0.0.1:8080".to_string(),
            }
        }
    }

    impl ServerConfig {
        pub fn from_env() -> Self {
            // ---
            let bind_addr = std::env::var("AXUM_BIND_ADDR")
                .unwrap_or_else(|_| ServerConfig::default().bind_addr);
            Self { bind_addr }
        }
    }
}
pub use server::ServerConfig;

// ============================================================
// Logging configuration
// ============================================================

mod logging {
    // ---
    use crate::infrastructure::logging::{LogFormat, LogOutput};

    /// Log formatting and sink configuration.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// `json` (default) or `pretty`.
        pub format: LogFormat,

        /// `stdout` (default) or a file path.
        pub output: LogOutput,

        /// Maximum number of lines buffered for the sink before new lines are dropped.
        pub queue_capacity: usize,

        /// `EnvFilter` directive, taken from `RUST_LOG`. Defaults to `info`.
        pub filter: String,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                format: LogFormat::Json,
                output: LogOutput::Stdout,
                queue_capacity: 128_000,
                filter: "info".to_string(),
            }
        }
    }

    impl LoggingConfig {
        pub fn from_env() -> Self {
            // ---
            let defaults = Self::default();
            Self {
                format: optional_env_with!("AXUM_LOG_FORMAT", LogFormat::parse, defaults.format),
                output: std::env::var("AXUM_LOG_OUTPUT")
                    .map(|v| LogOutput::parse(&v))
                    .unwrap_or(defaults.output),
                queue_capacity: optional_env_parse!(
                    "AXUM_LOG_QUEUE_CAPACITY",
                    usize,
                    defaults.queue_capacity
                ),
                filter: std::env::var("RUST_LOG").unwrap_or(defaults.filter),
            }
        }
    }
}
pub use logging::LoggingConfig;

// ============================================================
// Metrics configuration
// ============================================================

mod metrics {
    // ---

    /// Latency buckets (seconds), matching the Python Prometheus client defaults.
    pub const DEFAULT_DURATION_BUCKETS: [f64; 14] = [
        0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
    ];

    /// Which metrics backend to build.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub enum MetricsBackend {
        #[default]
        Prometheus,
        Noop,
    }

    /// Metrics backend and histogram layout.
    #[derive(Debug, Clone)]
    pub struct MetricsConfig {
        pub backend: MetricsBackend,
        pub duration_buckets: Vec<f64>,
    }

    impl Default for MetricsConfig {
        fn default() -> Self {
            Self {
                backend: MetricsBackend::Prometheus,
                duration_buckets: DEFAULT_DURATION_BUCKETS.to_vec(),
            }
        }
    }

    /// Parses a comma-separated, strictly ascending list of finite bounds.
    pub(super) fn parse_buckets(raw: &str) -> Option<Vec<f64>> {
        // ---
        let buckets = raw
            .split(',')
            .map(|b| b.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect::<Option<Vec<_>>>()?;

        let ascending = buckets.windows(2).all(|w| w[0] < w[1]);
        (!buckets.is_empty() && ascending).then_some(buckets)
    }

    impl MetricsConfig {
        pub fn from_env() -> Self {
            // ---
            let backend = match std::env::var("AXUM_METRICS_TYPE").as_deref() {
                Ok("noop") => MetricsBackend::Noop,
                _ => MetricsBackend::Prometheus,
            };
            let duration_buckets = optional_env_with!(
                "AXUM_METRICS_DURATION_BUCKETS",
                parse_buckets,
                DEFAULT_DURATION_BUCKETS.to_vec()
            );

            Self {
                backend,
                duration_buckets,
            }
        }
    }
}
pub use metrics::{MetricsBackend, MetricsConfig, DEFAULT_DURATION_BUCKETS};

// ============================================================
// Storage configuration
// ============================================================

mod storage {
    // ---
    use super::*;

    /// Database-related configuration derived from environment variables.
    ///
    /// Only required when `AXUM_ITEMS_STORE=postgres`.
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        /// PostgreSQL connection string.
        pub database_url: String,

        /// Number of retry attempts when initializing the database connection. Defaults to 50.
        pub retry_count: u32,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Minimum number of connections to keep in the pool, even when idle. Defaults to 2.
        pub min_connections: u32,

        /// Maximum number of connections to be open concurrently. Defaults to 15
        pub max_connections: u32,
    }

    impl DatabaseConfig {
        /// Builds a [`DatabaseConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if required configuration is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let database_url = required_env!("DATABASE_URL");
            let retry_count = optional_env_parse!("AXUM_DB_RETRY_COUNT", u32, 50);
            let acquire_timeout_secs = optional_env_parse!("AXUM_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let min_connections = optional_env_parse!("AXUM_DB_MIN_CONNECTIONS", u32, 2);
            let max_connections = optional_env_parse!("AXUM_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                database_url,
                retry_count,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                min_connections,
                max_connections,
            })
        }
    }

    /// Item store selection.
    #[derive(Debug, Clone, Default)]
    pub enum StorageConfig {
        /// Process-local store (default).
        #[default]
        Memory,
        Postgres(DatabaseConfig),
    }

    impl StorageConfig {
        /// Builds a [`StorageConfig`] from `AXUM_ITEMS_STORE`.
        ///
        /// # Errors
        /// Fails on an unknown store name, or when `postgres` is selected
        /// without `DATABASE_URL`.
        pub fn from_env() -> Result<Self> {
            // ---
            match std::env::var("AXUM_ITEMS_STORE").as_deref() {
                Err(_) | Ok("memory") => Ok(Self::Memory),
                Ok("postgres") => Ok(Self::Postgres(DatabaseConfig::from_env()?)),
                Ok(other) => Err(anyhow::anyhow!("Unknown AXUM_ITEMS_STORE: {other}")),
            }
        }
    }
}
pub use storage::{DatabaseConfig, StorageConfig};

// ============================================================
// Demo endpoint configuration
// ============================================================

mod demo {
    // ---
    use super::*;

    /// Simulated latencies for the demo endpoints.
    #[derive(Debug, Clone)]
    pub struct DemoConfig {
        /// Delay applied by `/api/data`. Defaults to 100-500 ms.
        pub data_delay: DelayRange,

        /// Delay applied by `/slow`. Defaults to 1000-3000 ms.
        pub slow_delay: DelayRange,
    }

    impl Default for DemoConfig {
        fn default() -> Self {
            Self {
                data_delay: DelayRange::from_millis(100, 500),
                slow_delay: DelayRange::from_millis(1_000, 3_000),
            }
        }
    }

    impl DemoConfig {
        pub fn from_env() -> Self {
            // ---
            let defaults = Self::default();
            Self {
                data_delay: optional_env_with!(
                    "AXUM_DEMO_DATA_DELAY_MS",
                    parse_delay_range,
                    defaults.data_delay
                ),
                slow_delay: optional_env_with!(
                    "AXUM_DEMO_SLOW_DELAY_MS",
                    parse_delay_range,
                    defaults.slow_delay
                ),
            }
        }
    }
}
pub use demo::DemoConfig;

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::infrastructure::logging::{LogFormat, LogOutput};
    use anyhow::Result;
    use serial_test::serial;

    #[test]
    #[serial]
    fn missing_database_url_fails() -> Result<()> {
        // ---
        std::env::remove_var("DATABASE_URL");

        assert_missing_config!(DatabaseConfig::from_env(), "DATABASE_URL");

        Ok(())
    }

    #[test]
    #[serial]
    fn postgres_store_requires_database_url() -> Result<()> {
        // ---
        std::env::set_var("AXUM_ITEMS_STORE", "postgres");
        std::env::remove_var("DATABASE_URL");

        assert_missing_config!(StorageConfig::from_env(), "DATABASE_URL");

        std::env::remove_var("AXUM_ITEMS_STORE");
        Ok(())
    }

    #[test]
    #[serial]
    fn unknown_store_is_rejected() {
        // ---
        std::env::set_var("AXUM_ITEMS_STORE", "sqlite");
        assert!(StorageConfig::from_env().is_err());
        std::env::remove_var("AXUM_ITEMS_STORE");
    }

    #[test]
    #[serial]
    fn database_defaults_applied() -> Result<()> {
        // ---
        let db_url = "postgres://test";
        std::env::set_var("DATABASE_URL", db_url); // required

        std::env::remove_var("AXUM_DB_RETRY_COUNT");
        std::env::remove_var("AXUM_DB_ACQUIRE_TIMEOUT_SEC");
        std::env::remove_var("AXUM_DB_MIN_CONNECTIONS");
        std::env::remove_var("AXUM_DB_MAX_CONNECTIONS");

        let cfg = DatabaseConfig::from_env()?;
        assert_eq!(cfg.database_url, db_url);
        assert_eq!(cfg.retry_count, 50);
        assert_eq!(cfg.acquire_timeout.as_secs(), 30);
        assert_eq!(cfg.min_connections, 2);
        assert_eq!(cfg.max_connections, 15);

        Ok(())
    }

    #[test]
    #[serial]
    fn database_overrides_defaults() -> Result<()> {
        // ---
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("AXUM_DB_RETRY_COUNT", "3");
        std::env::set_var("AXUM_DB_ACQUIRE_TIMEOUT_SEC", "5");
        std::env::set_var("AXUM_DB_MIN_CONNECTIONS", "10");
        std::env::set_var("AXUM_DB_MAX_CONNECTIONS", "1000");

        let cfg = DatabaseConfig::from_env()?;
        assert_eq!(cfg.retry_count, 3);
        assert_eq!(cfg.acquire_timeout.as_secs(), 5);
        assert_eq!(cfg.min_connections, 10);
        assert_eq!(cfg.max_connections, 1000);

        for key in [
            "AXUM_DB_RETRY_COUNT",
            "AXUM_DB_ACQUIRE_TIMEOUT_SEC",
            "AXUM_DB_MIN_CONNECTIONS",
            "AXUM_DB_MAX_CONNECTIONS",
        ] {
            std::env::remove_var(key);
        }
        Ok(())
    }

    #[test]
    #[serial]
    fn metrics_and_logging_overrides() {
        // ---
        std::env::set_var("AXUM_METRICS_TYPE", "noop");
        std::env::set_var("AXUM_METRICS_DURATION_BUCKETS", "0.1, 0.5, 1.0");
        std::env::set_var("AXUM_LOG_FORMAT", "pretty");
        std::env::set_var("AXUM_LOG_OUTPUT", "/tmp/service.log");

        let metrics = MetricsConfig::from_env();
        assert_eq!(metrics.backend, MetricsBackend::Noop);
        assert_eq!(metrics.duration_buckets, vec![0.1, 0.5, 1.0]);

        let logging = LoggingConfig::from_env();
        assert_eq!(logging.format, LogFormat::Pretty);
        assert_eq!(logging.output, LogOutput::File("/tmp/service.log".into()));

        for key in [
            "AXUM_METRICS_TYPE",
            "AXUM_METRICS_DURATION_BUCKETS",
            "AXUM_LOG_FORMAT",
            "AXUM_LOG_OUTPUT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn invalid_buckets_fall_back_to_defaults() {
        // ---
        std::env::set_var("AXUM_METRICS_DURATION_BUCKETS", "1.0,0.5");
        assert_eq!(
            MetricsConfig::from_env().duration_buckets,
            DEFAULT_DURATION_BUCKETS.to_vec()
        );

        std::env::set_var("AXUM_METRICS_DURATION_BUCKETS", "fast,slow");
        assert_eq!(
            MetricsConfig::from_env().duration_buckets,
            DEFAULT_DURATION_BUCKETS.to_vec()
        );

        std::env::remove_var("AXUM_METRICS_DURATION_BUCKETS");
    }

    #[test]
    fn delay_ranges_parse() {
        // ---
        assert_eq!(parse_delay_range("100-500"), Some(DelayRange::from_millis(100, 500)));
        assert_eq!(parse_delay_range("0"), Some(DelayRange::none()));
        assert_eq!(parse_delay_range("500-100"), None);
        assert_eq!(parse_delay_range("soon"), None);
    }

    #[test]
    #[serial]
    fn app_config_from_env_success() -> Result<()> {
        // ---
        std::env::remove_var("AXUM_ITEMS_STORE");
        std::env::remove_var("AXUM_BIND_ADDR");
        std::env::set_var("AXUM_DEMO_SLOW_DELAY_MS", "5-10");

        let cfg = AppConfig::from_env()?;
        assert!(matches!(cfg.storage, StorageConfig::Memory));
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.demo.slow_delay, DelayRange::from_millis(5, 10));
        assert_eq!(cfg.demo.data_delay, DelayRange::from_millis(100, 500));

        std::env::remove_var("AXUM_DEMO_SLOW_DELAY_MS");
        Ok(())
    }
}
