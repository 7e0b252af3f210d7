use anyhow::{Context, Result};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tradfri_bridge::api::{create_status_router, StatusAppState};
use tradfri_bridge::bridge::Bridge;
use tradfri_bridge::config::{load_config, BridgeConfig, CONFIG_PATH_ENV};
use tradfri_bridge::dispatch::Dispatcher;
use tradfri_bridge::nats::NatsClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradfri_bridge=info".into()),
        )
        .init();

    info!("Tradfri bridge starting...");

    let mut config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => load_config(&path)?,
        Err(_) => BridgeConfig::default(),
    };
    config.apply_env();

    let bridge_id = config
        .bridge
        .id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(
        bridge_id = %bridge_id,
        nats_url = %config.nats.url,
        command_subject = %config.bridge.command_subject,
        raw_prefix = %config.bridge.raw_prefix,
        api_enabled = config.api.enabled,
        api_port = config.api.port,
        "Configuration loaded"
    );

    let client = NatsClient::connect(&config.nats).await?;
    let bridge = Bridge::new(Arc::new(client.publisher()), &bridge_id, &config);

    let dispatcher = Arc::new(Dispatcher::spawn(bridge.clone(), &config.dispatch));

    // Forward gateway traffic into the dispatcher
    let nats_handle = {
        let dispatcher = Arc::clone(&dispatcher);
        let section = config.bridge.clone();
        let reply_subject = config.bridge.reply_subject(&bridge_id);
        tokio::spawn(async move {
            if let Err(e) = client.run(&section, &reply_subject, &dispatcher).await {
                tracing::error!(error = %e, "NATS listener error");
            }
        })
    };

    // Start HTTP status API
    let server_handle = if config.api.enabled {
        let state = Arc::new(StatusAppState {
            bridge: Arc::clone(&bridge),
            dispatch: Some(dispatcher.stats()),
        });
        let router = create_status_router(state).layer(CorsLayer::permissive());
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.api.port))
            .await
            .context("Failed to bind status API port")?;
        info!(port = config.api.port, "Status API listening");

        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Status API server error");
            }
        }))
    } else {
        None
    };

    // Initial state pull; pushes keep the mirror current afterwards
    let refresh_handle = {
        let bridge = Arc::clone(&bridge);
        tokio::spawn(async move {
            bridge.refresh().await;
        })
    };

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    // Graceful shutdown
    refresh_handle.abort();
    if let Some(handle) = server_handle {
        handle.abort();
    }
    nats_handle.abort();
    let _ = nats_handle.await;

    match Arc::try_unwrap(dispatcher) {
        Ok(dispatcher) => dispatcher.shutdown().await,
        Err(_) => warn!("Dispatcher still shared at shutdown, skipping drain"),
    }
    info!("Tradfri bridge stopped");

    Ok(())
}
