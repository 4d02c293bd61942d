//! FormRelay Web Server - receives quote and contact form submissions.
//!
//! Each submission is validated, appended to its JSON collection and
//! announced by two emails (operator notification, client acknowledgment).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formrelay::config::StoreBackend;
use formrelay::{
    build_mailer, router, AppState, Config, Dispatcher, JsonFileStore, MailIdentity, MemoryStore,
    RecordStore, RetryPolicy, SubmissionPipeline,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        development = config.development,
        store_backend = ?config.store_backend,
        data_dir = %config.data_dir.display(),
        mail_provider = config.mail_provider.as_str(),
        mail_max_attempts = config.mail_max_attempts,
        "config_loaded"
    );

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Json => {
            let store = JsonFileStore::new(config.data_dir.clone());
            if let Err(e) = store.init().await {
                // Appends will keep failing and be reported as persisted=false
                error!(error = %e, "store_init_failed");
            }
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("store_memory_only");
            Arc::new(MemoryStore::new())
        }
    };

    let mailer = build_mailer(&config).context("Failed to build mailer")?;
    match mailer.verify().await {
        Ok(()) => info!(provider = mailer.name(), "mail_provider_verified"),
        Err(e) => warn!(
            provider = mailer.name(),
            configured = mailer.configured(),
            error = %e,
            "mail_provider_unverified"
        ),
    }

    let dispatcher = Dispatcher::new(Arc::clone(&mailer), RetryPolicy::from_config(&config));
    let pipeline = SubmissionPipeline::new(store, dispatcher, MailIdentity::from_config(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, pipeline));

    // Bind to address
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    mailer.close().await;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
