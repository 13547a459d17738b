use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use updraft_simulator::{Api, EngineConfig, Simulator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let host = std::env::var("UPDRAFT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("UPDRAFT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4000);

    let config = EngineConfig::from_env();
    let simulator = Arc::new(Simulator::new(config));
    simulator.start();

    let app = Api::new(simulator).router();

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("invalid listen addr")?;
    info!(%addr, "updraft simulator listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
