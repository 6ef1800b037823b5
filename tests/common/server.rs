//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own snapshot database, wired to
//! the platforms through source URL overrides.

use super::constants::*;
use chart_harvest_server::collectors::{ChartHttpClient, TurntableCollector};
use chart_harvest_server::harvest::{source_url, CollectorRegistry, HarvestPipeline};
use chart_harvest_server::rate_limiter::{RateLimitConfig, TokenBucketLimiter};
use chart_harvest_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use chart_harvest_server::snapshot_store::SqliteSnapshotStore;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server whose platforms read from `sources`, with a rate limit
    /// generous enough to stay out of the way.
    pub async fn spawn(sources: HashMap<String, String>) -> Self {
        Self::spawn_with_rate_limit(
            sources,
            RateLimitConfig {
                rate_per_minute: 6000,
                burst: 1000,
            },
        )
        .await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created, the port cannot be bound, or
    /// the server doesn't become ready within timeout.
    pub async fn spawn_with_rate_limit(
        sources: HashMap<String, String>,
        rate_limit: RateLimitConfig,
    ) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SqliteSnapshotStore::new(temp_db_dir.path().join("harvest.db"))
            .expect("Failed to open snapshot store");

        let http = ChartHttpClient::new("chart-harvest-e2e", Duration::from_secs(5))
            .expect("Failed to build HTTP client");
        let registry = CollectorRegistry::default_platforms(&http, &sources);
        let pipeline = HarvestPipeline::new(Arc::new(registry), Duration::from_secs(10));
        let chart_source = TurntableCollector::new(
            http,
            source_url(&sources, "turntable", "http://127.0.0.1:1/turntable"),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..ServerConfig::default()
        };
        let state = ServerState::new(
            config,
            Arc::new(pipeline),
            Arc::new(store),
            Arc::new(chart_source),
            Arc::new(TokenBucketLimiter::with_config(rate_limit)),
        );
        let app = make_app(state);

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the /health endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/health", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
