use std::error::Error as StdError;
use std::net::SocketAddr;

use tracing::info;

use recipe_sharing_api::config::AppConfig;
use recipe_sharing_api::routes::{AppState, create_app_router};
use recipe_sharing_api::storage::start_session_cleanup_task;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn StdError + Send + Sync + 'static>> {
    dotenvy::dotenv().ok();

    // RUST_LOG environment variable controls log level (default: info)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("Application starting...");

    let config = AppConfig::from_env()?;
    let port = config.port;
    let state = AppState::init(config).await?;

    // Sweep expired sessions for as long as the server runs
    tokio::spawn(start_session_cleanup_task(state.pool.clone()));

    let app = create_app_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    info!("Health check available at http://{}/health", addr);
    info!("OpenAPI document available at http://{}/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve when the process is asked to stop.
///
/// Handles both SIGINT (Ctrl+C) and SIGTERM (Docker stop).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("SIGINT received, shutting down gracefully");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down gracefully");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
    }
}
