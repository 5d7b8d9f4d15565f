//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use authgate::auth::MemoryDirectory;
use authgate::config::GatewayConfig;
use authgate::http::HttpServer;
use authgate::lifecycle::Shutdown;
use authgate::observability::event_log::{EventLog, LogConfig, LogLevel};

pub const ADMIN_KEY: &str = "test-admin-key";

/// A gateway instance bound to an ephemeral port, with a handle on its
/// event log for assertions.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub log: Arc<EventLog>,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Base test config: admin enabled with a known key, defaults elsewhere.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config
}

/// Spawn a gateway with the given config. Console output is disabled and
/// the log floor dropped to debug so every entry is observable.
pub async fn spawn_gateway(config: GatewayConfig) -> TestGateway {
    let log = Arc::new(EventLog::new(LogConfig {
        min_level: LogLevel::Debug,
        enable_console: false,
        ..LogConfig::default()
    }));
    let directory = Arc::new(MemoryDirectory::new());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, log.clone(), directory);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    // Wait for the accept loop to come up.
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestGateway { addr, log, shutdown }
}
