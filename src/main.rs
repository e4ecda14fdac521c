// src/main.rs
use clap::Parser;
use spot_gateway::adapter::{serve, shutdown_signal, Registry, Router};
use spot_gateway::config::{Cli, Config};
use spot_gateway::domain::errors::AppResult;
use spot_gateway::exchange::{BybitApi, GateioApi, OkxApi};

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli)?;

    // Initialize logging
    config.init_logging()?;

    log::info!("Application start, spot_gateway v{}", env!("CARGO_PKG_VERSION"));

    let registry = Registry::new()
        .with(GateioApi::new(&config.gateio()))
        .with(BybitApi::new(&config.bybit()))
        .with(OkxApi::new(&config.okx()));
    log::info!("Serving exchanges: {}", registry.ids().join(", "));

    let router = Router::new(registry, config.request_timeout());

    let result = serve(config.server.addr, router, config.shutdown_timeout(), shutdown_signal()).await;
    if let Err(e) = &result {
        log::error!("Server error: {}", e);
    }

    log::info!("Application stop");
    result
}
