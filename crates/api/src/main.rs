use std::sync::Arc;

use anyhow::Context;

use ageforge_ai::{RetryingGateway, TransformationGateway};
use ageforge_api::app::{AppServices, build_app};
use ageforge_infra::AppConfig;
use ageforge_infra::gateway::ReplicateGateway;
use ageforge_infra::jobs::InMemoryJobStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    ageforge_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");

    if !config.gateway.has_credentials() {
        tracing::warn!("REPLICATE_API_KEY not set; transformations will fail");
    }

    let replicate =
        ReplicateGateway::new(config.gateway.clone()).context("failed to build gateway client")?;
    let gateway: Arc<dyn TransformationGateway> =
        Arc::new(RetryingGateway::new(replicate, config.gateway.retry.clone()));

    let store = InMemoryJobStore::arc();
    let sweeper = config
        .retention
        .sweeper()
        .spawn("job-retention", store.clone());

    let services = Arc::new(AppServices::new(store, gateway));
    let app = build_app(services, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.shutdown().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
