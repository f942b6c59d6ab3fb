//! eln-webhooks - serves the demo webhook set to the ELN platform.
//!
//! Config comes from `WEBHOOK_CONFIG` (YAML) and `WEBHOOK_*` env vars; see
//! `WebhookConfig`. `--memory` swaps the REST platform for a seeded
//! in-memory one, for trying handlers with curl.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use webhook_core::platform::{ElnEntryCriteria, ElnEntryType, FieldMap};
use webhook_core::{MemoryPlatform, PlatformConnector};
use webhook_server::{build_router, AppState, RestConnector, WebhookConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = WebhookConfig::from_env().context("Invalid webhook configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = Arc::new(eln_webhooks::build_registry()?);
    for route in registry.routes() {
        tracing::debug!(path = %route.path, handler = route.handler.name(), "Registered webhook");
    }

    let connector: Arc<dyn PlatformConnector> = if std::env::args().any(|a| a == "--memory") {
        tracing::warn!("Using the in-memory platform; nothing is persisted");
        Arc::new(seed_demo_platform())
    } else {
        Arc::new(RestConnector::new(&config).context("Failed to build platform client")?)
    };

    let state = AppState::new(registry.clone(), connector).with_config(&config);
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        %addr,
        routes = registry.len(),
        debug = config.debug,
        verify_platform_cert = config.verify_platform_cert,
        "Webhook server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

/// One experiment (id 1) with a source and an aliquot sample table.
fn seed_demo_platform() -> MemoryPlatform {
    let platform = MemoryPlatform::new();
    let experiment = platform.create_experiment("Webhook Demo");
    let exp_id = experiment.notebook_experiment_id;

    platform.add_entry(exp_id, ElnEntryCriteria::new(ElnEntryType::Text, "Experiment Overview", 0));
    let samples = platform.add_entry(
        exp_id,
        ElnEntryCriteria::new(ElnEntryType::Table, "Samples", 1).with_data_type("Sample"),
    );
    let aliquots = platform.add_entry(
        exp_id,
        ElnEntryCriteria::new(ElnEntryType::Table, "Aliquots", 2).with_data_type("Sample"),
    );

    let sample = |id: &str| FieldMap::from([("SampleId".to_string(), json!(id))]);
    let sources = platform.add_records("Sample", vec![sample("S-1"), sample("S-2")]);
    let children = platform.add_records("Sample", vec![sample("S-1-A"), sample("S-2-A")]);
    platform.attach_records(samples.entry_id, &sources);
    platform.attach_records(aliquots.entry_id, &children);

    tracing::info!(experiment_id = exp_id, "Seeded demo experiment");
    platform
}
