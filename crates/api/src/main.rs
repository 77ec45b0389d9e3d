//! Careslot - appointment booking backend
//!
//! Main entry point for the HTTP service.

use std::sync::Arc;

use anyhow::Context;
use careslot_app::{router, AppContext};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => warn!(error = %err, "could not load .env file"),
    }

    let config = careslot_infra::config::load().context("failed to load configuration")?;
    let bind_addr = config.server.bind_addr.clone();

    let ctx = Arc::new(AppContext::new(config).context("failed to initialise application")?);

    let mut reconciler = ctx.reconciler();
    reconciler.start().await.context("failed to start relabel reconciler")?;

    let app = router(Arc::clone(&ctx));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!(addr = %bind_addr, "careslot api listening");

    axum::serve(listener, app).await.context("server error")?;

    reconciler.stop().await.ok();

    Ok(())
}
