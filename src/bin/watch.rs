//! Market update watcher — resolves a symbol, subscribes to its pushed
//! updates, and logs every snapshot until Ctrl-C.
//!
//! Usage:
//!   cargo run --bin watch                  # defaults to btcusd
//!   cargo run --bin watch -- lunausd

use anyhow::{bail, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use updown_markets::api::MarketsApi;
use updown_markets::config::Config;
use updown_markets::ws::hub::HubClient;

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    let _ = dotenvy::dotenv();

    let config = if Path::new("updown.toml").exists() {
        Config::load(Path::new("updown.toml"))?
    } else {
        Config::from_env()?
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "btcusd".to_string());

    info!(
        network = %config.network,
        symbol = %symbol,
        "updown watch v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let api = Arc::new(MarketsApi::from_config(&config));

    match api.resolve_contract_address(&symbol).await? {
        Some(address) => info!(symbol = %symbol, contract = %address, "symbol resolved"),
        None => bail!("symbol {symbol} is not listed on {}", config.network),
    }

    let hub = HubClient::new(api, &config.hub);

    hub.on_market_update(|update| {
        info!(
            symbol = %update.symbol,
            last_price = update.last_price.as_deref().unwrap_or("-"),
            status = ?update.status,
            update_date = %update.update_date,
            "market update"
        );
    });

    hub.subscribe(&symbol).await?;
    info!(client_id = %hub.client_id(), "subscribed, waiting for updates (Ctrl-C to exit)");

    tokio::signal::ctrl_c().await?;

    if let Err(e) = hub.unsubscribe(&symbol).await {
        warn!(error = %e, "unsubscribe failed during shutdown");
    }
    hub.stop().await;

    Ok(())
}
