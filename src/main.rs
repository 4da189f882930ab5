//! happymap - world happiness map data server
//!
//! This is the main entry point for the API server.

use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use happymap::data_loader::load_dataset;
use happymap::handlers::{heartbeat, router};
use happymap::{init_tracing, Config, HappyMapError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    heartbeat::mark_started();

    // Load configuration
    let config = Config::load()?;
    init_tracing(&config.log_level);

    info!("Starting happymap v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!(
        table = %config.data.table_path.display(),
        coordinates = %config.data.coordinates_path.display(),
        "Loading dataset"
    );

    let app_state = load_dataset(config.clone()).map_err(|e| {
        error!("Failed to load dataset: {}", e);
        e
    })?;

    app_state.validate().map_err(|e| {
        error!("Invalid application state: {}", e);
        e
    })?;

    info!("Found {} years", app_state.dataset.years().len());
    info!("Found {} countries", app_state.dataset.coordinates.len());

    let state = std::sync::Arc::new(app_state);
    let app = router(state);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|e| HappyMapError::Config {
                message: format!("Invalid host address: {}", e),
            })?,
        config.server.port,
    ));

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| HappyMapError::Server {
            message: format!("Failed to bind to address: {}", e),
        })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HappyMapError::Server {
            message: format!("Server error: {}", e),
        })?;

    info!("Server has been gracefully shut down");
    Ok(())
}

/// Wait for a shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
