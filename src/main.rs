//! Potential matrix scoring service: binary entrypoint.
//! Boots the Axum HTTP server with the engine loaded from config.

use anyhow::Context;
use potential_matrix::{app, debug, EngineConfig, ScoringEngine, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    debug::init_tracing();

    let config = EngineConfig::load().context("loading engine config")?;
    let engine = ScoringEngine::new(config).context("building scoring engine")?;

    let server = ServerConfig::from_env()?;
    let addr = server.socket_addr()?;
    let router = app(engine, &server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, debug_routes = server.debug_routes, "listening");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
