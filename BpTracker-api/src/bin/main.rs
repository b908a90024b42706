use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use bp_tracker_api::api::{create_app, AppState};
use bp_tracker_api::config::{ServerConfig, StorageBackend};
use bp_tracker_data::repository::{InMemoryStorage, KeyValueStorage, RecordStore};
use bp_tracker_domain::clients::GeminiClient;
use bp_tracker_domain::config::AiConfig;

/// Entry point for the BpTracker API server
///
/// Loads `.env`, sets up tracing, opens the record store on the configured
/// backend, wires the text-generation client and serves until Ctrl+C or
/// SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(false)
            .with_ansi(true)
            .with_timer(fmt::time::uptime())
            .with_writer(std::io::stdout))
        .with(env_filter)
        .init();

    info!("Starting BpTracker API server");

    let backend = StorageBackend::from_env().context("invalid storage configuration")?;
    let storage = open_storage(backend)?;
    let store = RecordStore::open(storage).context("failed to load stored records")?;
    info!(
        "Record store ready on {} backend with {} records",
        store.backend_name(),
        store.len()?
    );

    let ai_config = AiConfig::from_env().context("invalid AI configuration")?;
    if !ai_config.is_configured() {
        warn!("GEMINI_API_KEY is not set; import and analysis requests will fail");
    }
    let client = Arc::new(GeminiClient::new(ai_config.clone()).context("failed to build AI client")?);

    let server = ServerConfig::from_env().context("invalid server configuration")?;

    let state = AppState::new(Arc::new(store), client.clone(), client, ai_config);
    let app = create_app(state, &server.allowed_origins);
    let addr = server.socket_addr();
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn open_storage(backend: StorageBackend) -> anyhow::Result<Box<dyn KeyValueStorage>> {
    match backend {
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite => {
            use bp_tracker_data::database::DatabaseConfig;
            use bp_tracker_data::repository::SqliteStorage;

            let config = DatabaseConfig::from_env()?;
            let storage = SqliteStorage::open(&config)
                .with_context(|| format!("failed to open {}", config.sqlite_path))?;
            Ok(Box::new(storage))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageBackend::Sqlite => {
            anyhow::bail!("this build has no SQLite support; set STORAGE_BACKEND=memory")
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; records are lost on exit");
            Ok(Box::new(InMemoryStorage::new()))
        }
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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

    info!("Shutting down server...");
}
