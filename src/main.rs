//! Custom error pages backend.
//!
//! The ingress controller forwards failed requests here with `X-Code` and
//! `X-Format` set; the backend answers with a matching page from disk.
//!
//! ```text
//!     ingress ──X-Code/X-Format──▶ http server ──▶ pages::format
//!                                                      │
//!                                                      ▼
//!                                                pages::locator
//!                                         (<code>.ext → <class>xx.ext)
//!                                                      │
//!                                                      ▼
//!     ingress ◀──────── status + page ──────── pages::render
//!                                          (verbatim | template)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use custom_error_pages::config::load_config;
use custom_error_pages::observability::{logging, metrics};
use custom_error_pages::HttpServer;

#[derive(Parser)]
#[command(name = "custom-error-pages")]
#[command(about = "Serves custom error pages on behalf of an ingress controller", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables are applied on top.
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "custom-error-pages starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        error_files_path = %config.pages.error_files_path,
        templating = config.templating.enabled,
        debug = config.debug,
        "Configuration loaded"
    );

    if !std::path::Path::new(&config.pages.error_files_path).is_dir() {
        tracing::warn!(
            error_files_path = %config.pages.error_files_path,
            "Error files path is not a directory; every request will get a generic 404"
        );
    }

    let metrics = if config.observability.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, metrics);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
