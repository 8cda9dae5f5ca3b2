//! Shared utilities for integration testing.

use std::fs;
use std::net::SocketAddr;

use custom_error_pages::lifecycle::Shutdown;
use custom_error_pages::{HttpServer, ServiceConfig};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Create a page directory holding `files` as (name, content) pairs.
pub fn page_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

/// Default config pointing at `dir`.
pub fn config_for(dir: &TempDir) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.pages.error_files_path = dir.path().to_string_lossy().into_owned();
    config
}

/// Start a server on an ephemeral port. It stops when the returned
/// coordinator is triggered or dropped with the test runtime.
pub async fn start_server(config: ServiceConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, None);
    let stop = shutdown.wait();
    tokio::spawn(async move {
        let _ = server.run_until(listener, stop).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
