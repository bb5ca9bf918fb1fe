use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskgate_api::auth::ApiKeyGate;
use taskgate_api::config;
use taskgate_api::database::{InMemoryTaskStore, PgTaskStore, TaskStore};
use taskgate_api::AppState;

#[derive(Parser)]
#[command(name = "taskgate-api")]
#[command(about = "Task item API guarded by a shared API key")]
#[command(version)]
struct Args {
    #[arg(long, help = "Bind host (overrides HOST)")]
    host: Option<String>,

    #[arg(long, help = "Bind port (overrides TASKGATE_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Use the in-memory store even if DATABASE_URL is set")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up API_KEY, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = config::config();
    config.validate()?;
    tracing::info!("Starting taskgate-api in {:?} mode", config.environment);

    let mut pg_store = None;
    let store: Arc<dyn TaskStore> = match (&config.database.url, args.in_memory) {
        (Some(_), false) => {
            let pg = PgTaskStore::connect(&config.database)
                .await
                .context("failed to connect task store")?;
            pg_store = Some(pg.clone());
            Arc::new(pg)
        }
        _ => {
            tracing::info!("Using in-memory task store");
            Arc::new(InMemoryTaskStore::new())
        }
    };

    let state = AppState::new(store, ApiKeyGate::new(&config.security.api_key));
    let app = taskgate_api::app(state, &config.security);

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("taskgate-api listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pg) = pg_store {
        pg.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
