use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stashbot_core::{
    create_authenticator, load_config, validate_config, AlistClient, Authenticator,
    BatchCoordinator, CleanupService, CredentialCache, HttpSearcher, MagnetSearcher,
    MaintenanceScheduler, StorageApi, Submitter,
};
use stashbot_server::api::create_router;
use stashbot_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

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

    info!(version = VERSION, "Starting stashbot");

    // Determine config path
    let config_path = std::env::var("STASHBOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Storage: {} (offline dir {})", config.storage.url, config.storage.offline_dir);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Storage client and the process-wide credential
    let storage: Arc<dyn StorageApi> = Arc::new(
        AlistClient::new(config.storage.clone()).context("Failed to create storage client")?,
    );
    let credentials = Arc::new(CredentialCache::new(
        storage,
        config.storage.username.clone(),
        config.storage.password.clone(),
    ));

    // Magnet search
    let searcher: Arc<dyn MagnetSearcher> = Arc::new(
        HttpSearcher::new(config.search.clone()).context("Failed to create search client")?,
    );
    info!("Using magnet search at {}", config.search.url);

    let submitter = Arc::new(Submitter::new(
        searcher,
        config.storage.offline_dir.clone(),
    ));
    let coordinator = Arc::new(BatchCoordinator::new(submitter, config.batch.clone()));
    let cleanup = Arc::new(CleanupService::from_config(&config.cleanup));

    // Scheduled sweep, if configured
    let scheduler = MaintenanceScheduler::new(
        Arc::clone(&credentials),
        Arc::clone(&cleanup),
        config.storage.offline_dir.clone(),
        config.cleanup.small_file_threshold_bytes,
        Duration::from_secs(config.cleanup.sweep_interval_secs),
    );
    let maintenance = if scheduler.start() {
        info!(
            interval_secs = config.cleanup.sweep_interval_secs,
            threshold_bytes = config.cleanup.small_file_threshold_bytes,
            "Scheduled sweep started"
        );
        Some(Arc::new(scheduler))
    } else {
        None
    };

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        credentials,
        coordinator,
        cleanup,
        maintenance.clone(),
    ));

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

    if let Some(ref scheduler) = maintenance {
        info!("Stopping scheduled sweep...");
        scheduler.stop();
    }

    info!("Server shut down");
    Ok(())
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
