//! Livestock Stock Management Platform - Backend Server

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lsm::{create_app, store::StockStore, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lsm_server=debug,lsm=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Livestock Stock Management Server");
    tracing::info!("Environment: {}", config.environment);

    // Image attachments land here
    tokio::fs::create_dir_all(&config.upload.dir).await?;

    // Create the entity store
    let store = StockStore::new(Duration::from_millis(config.store.op_timeout_ms));

    // Create application state
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
