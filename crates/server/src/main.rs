use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chainconv_core::{
    load_config, load_config_from_env, validate_config, Config, FfmpegHandler, HandlerRegistry,
    RouteEngine,
};
use chainconv_server::api::create_router;
use chainconv_server::state::AppState;

/// Environment variable naming the config file
const CONFIG_ENV: &str = "CHAINCONV_CONFIG";

/// Config file used when `CHAINCONV_CONFIG` is unset
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load()?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Default search mode: {}", config.routing.default_mode);

    // Register handlers in priority order
    let mut registry = HandlerRegistry::new();
    if config.ffmpeg.enabled {
        info!("Registering FFmpeg handler ({:?})", config.ffmpeg.ffmpeg_path);
        registry
            .register(Arc::new(FfmpegHandler::new(config.ffmpeg.clone())))
            .context("Failed to register FFmpeg handler")?;
    } else {
        info!("FFmpeg handler disabled in config");
    }

    if registry.is_empty() {
        warn!("No handlers registered, every route search will come back empty");
    }

    // Discover formats and build the route graph
    let mut engine = RouteEngine::new(registry, config.routing.clone());
    engine
        .refresh()
        .await
        .context("Failed to build route graph")?;
    info!(
        "Route graph ready: {} formats, {} edges",
        engine.graph().node_count(),
        engine.graph().edge_count()
    );

    let state = Arc::new(AppState::new(config.clone(), engine));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Loads the config file, or the environment alone when no file exists at
/// the default location.
fn load() -> Result<Config> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        Err(_) => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if path.exists() {
                info!("Loading configuration from {:?}", path);
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            } else {
                info!("No config file, using defaults and environment");
                load_config_from_env().context("Failed to load config from environment")
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
