use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trello_watcher::api::{create_router, AppState};
use trello_watcher::config::Config;
use trello_watcher::services::{FileRecorder, SyncEngine, WebhookManager};
use trello_watcher::trello::{BoardClient, TrelloClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,trello_watcher=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Trello watcher v{}...", env!("CARGO_PKG_VERSION"));

    let config = Config::load().context("Invalid configuration")?;

    let client: Arc<dyn BoardClient> = Arc::new(TrelloClient::new(
        reqwest::Client::new(),
        config.api_url.clone(),
        config.key.clone(),
        config.token.clone(),
    ));

    let webhooks = WebhookManager::load(Arc::clone(&client), &config.scheme, &config.host)
        .await
        .context("Unable to retrieve webhooks")?;
    let engine = SyncEngine::connect(Arc::clone(&client), &config.board_id, Arc::new(webhooks))
        .await
        .context("Failed to resolve board lists")?;
    let engine = Arc::new(engine);

    let recorder = Arc::new(FileRecorder::new(config.log_dir.clone()));
    let app = create_router(AppState::new(Arc::clone(&engine), recorder));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Trello watcher listening on http://{}", addr);

    // Registering a webhook makes the board service send a HEAD to our callback URL, so this can
    // only start once the listener is bound.
    let startup_engine = Arc::clone(&engine);
    tokio::spawn(async move {
        if let Err(e) = startup_engine.startup().await {
            tracing::error!("Startup reconciliation failed: {}", e);
            std::process::exit(1);
        }
        tracing::info!("Startup reconciliation finished");
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Trello watcher shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
