// ABOUTME: Server entry point: config, logging, resources, and the HTTP listener
// ABOUTME: Shuts down gracefully on ctrl-c
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use anyhow::Result;
use atrium::config::ServerConfig;
use atrium::context::ServerResources;
use atrium::logging::LoggingConfig;
use atrium::routes;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<()> {
    LoggingConfig::from_env().init()?;

    let config = ServerConfig::from_env()?;
    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "Starting server"
    );

    let resources = ServerResources::new(config.clone()).await?;
    let app = routes::router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
