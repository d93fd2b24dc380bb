mod config;
mod error;
mod handlers;
mod routes;
mod state;

use anyhow::{Context, Result};
use poller::{
    notify, CredentialStore, GmailProvider, MailProvider, PollInterval, Poller, PollerOptions,
    PollingConfig,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::routes::create_app;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailwatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;
    let polling = PollingConfig::load()?;
    let interval = PollInterval::from_secs_f64(polling.poll_interval_seconds)
        .context("POLL_INTERVAL_SECONDS must be a positive number")?;

    tracing::info!("Starting mailwatch");

    let credentials = Arc::new(CredentialStore::new(&polling.token_path));
    match credentials.load() {
        Ok(true) => tracing::info!("Authenticated successfully"),
        Ok(false) => tracing::warn!(
            "NOT AUTHENTICATED: run the authorization flow to create {}",
            credentials.path().display()
        ),
        Err(e) => tracing::error!("Error loading token: {}", e),
    }

    let provider: Arc<dyn MailProvider> = Arc::new(GmailProvider::new(&polling));
    let notifier = notify::from_config(&polling);
    let poller = Arc::new(Poller::new(
        credentials.clone(),
        provider,
        notifier.clone(),
        PollerOptions {
            interval,
            notify_existing_on_start: polling.notify_existing_on_start,
        },
    ));

    if credentials.is_authenticated() {
        poller.start(interval);
    }

    let state = AppState {
        credentials,
        poller: poller.clone(),
        notifier,
    };
    let app = create_app(state, config.cors_allowed_origins.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Available endpoints:");
    tracing::info!("  GET  /status        - authentication and monitoring status");
    tracing::info!("  GET  /emails        - current unread emails");
    tracing::info!("  POST /check-now     - check immediately");
    tracing::info!("  POST /set-interval  - change the check interval");
    tracing::info!("  POST /test          - send a test notification");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(poller))
        .await?;

    tracing::info!("mailwatch stopped");
    Ok(())
}

async fn shutdown_signal(poller: Arc<Poller>) {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received, stopping...");
    poller.stop();
}
