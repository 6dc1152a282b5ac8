//! Worklane gateway - HTTP server entry point

use std::net::SocketAddr;

use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;

use worklane::{Config, create_app, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Config::load validates; a nonsense config never reaches the server.
    let config = Config::load().map_err(|e| {
        std::io::Error::other(format!(
            "Failed to load configuration. Check config/ files and WORKLANE__* env vars: {}",
            e
        ))
    })?;

    init_tracing(&config.logging);

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting Worklane gateway"
    );

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let enable_docs = config.server.enable_docs;

    let app_handle = create_app(config);

    let addr = SocketAddr::new(server_host.parse()?, server_port);
    tracing::info!("Gateway listening on {}", addr);
    if enable_docs {
        tracing::info!("API documentation available at http://{}/docs", addr);
    }

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app_handle.router)
        .with_graceful_shutdown(shutdown_signal(app_handle.shutdown_token))
        .await?;

    tracing::info!("Gateway shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal, then cancel background tasks
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }

    shutdown_token.cancel();
}
