//! Wire types for the off-chain indexing service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::msg::MarketStatus;
use crate::contract::types::RoundResponse;

/// Directory entry for one listed market symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    #[serde(default)]
    pub description: String,
    /// Round interval in seconds.
    #[serde(default)]
    pub interval: u64,
}

/// Point-in-time market snapshot. Pushed to subscribers over the hub and
/// accepted back on the update endpoint. The client relays these without
/// caching; each event stands alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketUpdate {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_round: Option<RoundResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_round: Option<RoundResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_round: Option<RoundResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MarketStatus>,
    pub update_date: DateTime<Utc>,
}
