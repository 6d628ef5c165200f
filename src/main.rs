//! Gallery Mirror - backend-for-frontend server
//!
//! Serves the gallery facade as JSON over HTTP.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_mirror::api::{create_router, AppState};
use gallery_mirror::{Config, GalleryFacade};

/// Main entry point for the gallery server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the signed transport, cache and repository
/// 4. Start background expiry sweep
/// 5. Serve the router until SIGINT/SIGTERM
/// 6. Stop the sweep and cancel in-flight upstream fetches
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery_mirror=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gallery Mirror");

    let config = Config::from_env().context("loading configuration")?;
    info!(
        account = %config.account,
        api_base_url = %config.api_base_url,
        max_entries = config.cache.max_entries,
        port = config.server_port,
        "Configuration loaded"
    );

    let gallery = GalleryFacade::from_config(&config).context("building gallery access layer")?;
    let sweep = gallery.spawn_sweep(config.cache.sweep_interval);

    let app = create_router(AppState::new(gallery.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(gallery.clone()))
        .await
        .context("serving HTTP")?;

    sweep.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then cancels upstream
/// fetches so in-flight requests drain quickly.
async fn shutdown_signal(gallery: GalleryFacade) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    gallery.shutdown();
}
