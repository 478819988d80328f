mod api;
mod clock;
mod config;
mod contract;
mod errors;
mod market;
mod models;
mod orderbook;

use std::sync::Arc;

use api::ApiServer;
use clock::{Clock, SystemClock};
use config::Config;
use contract::SimulatedContract;
use market::{MarketStore, Ticker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // ── 1. Build the market around the simulated contract ──────────
    let gateway = Arc::new(SimulatedContract::new(
        config.network.contract_address.clone(),
        config.simulation.confirmation_delay,
        Arc::clone(&clock),
    ));
    let store = MarketStore::new(&config, Arc::clone(&clock), gateway);

    tracing::info!(
        "{} ({}) simulator starting on {}, contract {}, price {}",
        config.token.name,
        config.token.symbol,
        config.network.name,
        config.network.contract_address,
        store.market_state().current_price
    );

    // ── 2. Spawn the price ticker ──────────────────────────────────
    let ticker = Ticker::new(store.clone(), Arc::clone(&clock), config.ui.refresh_interval);
    tokio::spawn(ticker.run());

    // ── 3. Serve the dashboard API ─────────────────────────────────
    let server = ApiServer::new(store, config);
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            tracing::error!("API server stopped: {}", e);
        }
    });

    // ── 4. Keep main alive until Ctrl+C ───────────────────────────
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    Ok(())
}
