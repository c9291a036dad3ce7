//! hookstream entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration**: defaults, optional TOML file, environment
//!    overrides, validation. Any error exits before a socket is opened.
//! 2. **Wire observability**: `tracing-subscriber` with a JSON layer and an
//!    optional OpenTelemetry OTLP exporter.
//! 3. **Connect and provision**: open the NATS session and make sure every
//!    enabled provider's stream exists. Both steps are fatal on failure.
//! 4. **Serve**: build the [`relay::ReliablePublisher`] and the axum router,
//!    then accept webhooks until SIGINT/SIGTERM.
//! 5. **Shut down**: finish in-flight requests, drain the broker session,
//!    flush telemetry.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use broker::{JetStreamCatalog, NatsConnection};
use listener::{create_router, serve, AppState, GitHubAuth, GitLabAuth};
use relay::{initialize_streams, ReliablePublisher};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Invalid configuration")?;
    let telemetry = telemetry::init()?;

    let result = run(config).await;
    if let Err(err) = &result {
        error!("hookstream stopped with an error: {err:#}");
    }

    telemetry.shutdown();
    result
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(?config, "Starting hookstream");

    let connection = Arc::new(
        NatsConnection::connect(&config.broker_settings())
            .await
            .context("Failed to connect to broker")?,
    );

    let catalog = JetStreamCatalog::new(connection.jetstream().clone());
    let descriptors = config.stream_descriptors()?;
    initialize_streams(&catalog, &descriptors)
        .await
        .context("Failed to provision streams")?;

    let publisher = ReliablePublisher::new(connection.clone(), config.publish_policy()?);
    let mut state = AppState::new(publisher);
    if let Some(token) = config.gitlab_token() {
        state = state.with_gitlab(GitLabAuth::new(token));
    }
    if let Some(secret) = config.github_secret() {
        state = state.with_github(GitHubAuth::new(secret));
    }
    let router = create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    serve(listener, router, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Err(err) = connection.close().await {
        warn!(error = %err, "Broker connection did not close cleanly");
    }
    info!("hookstream stopped");
    Ok(())
}

/// Waits for CTRL+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received CTRL+C, starting graceful shutdown"),
        () = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
