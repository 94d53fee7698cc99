mod config;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use delegate::VideoDelegate;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const ENV_FILE: &str = ".env";

const DEFAULT_LOG_FILTER: &str = "server=info,video_service=info,delegate=info,tower_http=info";

/// Apply an env file on top of the process environment. Variables already
/// set win. A missing file is not an error.
fn load_env_file(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => {
            info!(path = %path.display(), "loaded environment file");
            true
        }
        Err(e) if e.not_found() => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not load environment file");
            false
        }
    }
}

/// API routes, with everything else served from the static directory
fn build_app(config: &Config, delegate: Arc<dyn VideoDelegate>) -> Router {
    video_service::create_router(delegate)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    load_env_file(Path::new(ENV_FILE));
    let config = Config::from_env().context("reading configuration")?;
    let delegate = config.build_delegate();
    info!(
        delegate = delegate.name(),
        static_dir = %config.static_dir.display(),
        "starting"
    );

    let app = build_app(&config, delegate);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    info!("Server running on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl+C handler");
    }
}
