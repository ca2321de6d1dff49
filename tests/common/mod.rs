// Test helpers are intentionally partially used
#![allow(dead_code)]

use axum_observability::{create_router_with_config, AppConfig, DelayRange, MetricsBackend};
use reqwest::Client;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

// ============================================================================
// Test Setup
// ============================================================================

/// Configuration used by the integration tests: in-memory store, Prometheus
/// metrics, and no simulated latency on the demo endpoints.
pub fn test_config() -> AppConfig {
    // ---
    let mut config = AppConfig::default();
    config.demo.data_delay = DelayRange::none();
    config.demo.slow_delay = DelayRange::none();
    config
}

pub fn noop_config() -> AppConfig {
    // ---
    let mut config = test_config();
    config.metrics.backend = MetricsBackend::Noop;
    config
}

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub client: Client,
}

impl TestServer {
    // ---
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        // --
        let app = create_router_with_config(&config)
            .await
            .expect("Should be able to create router");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start
        sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { addr, client }
    }

    pub fn url(&self, path: &str) -> String {
        // ---
        format!("http://{}{}", self.addr, path)
    }

    /// Fetches `/metrics` and returns the body.
    pub async fn scrape(&self) -> String {
        // ---
        self.client
            .get(self.url("/metrics"))
            .send()
            .await
            .expect("Failed to scrape metrics")
            .text()
            .await
            .expect("Failed to read metrics body")
    }
}
