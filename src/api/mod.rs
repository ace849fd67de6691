//! REST client for the off-chain indexing/notification service.
//!
//! Covers the symbol directory, round/market reads, the market update
//! endpoint, and per-symbol subscription registration. One request per
//! call, no caching; callers that need caching add it on top.
//!
//! Every request carries the instance's stable client identity in the
//! `X-UserId` header so the notification service can route pushed updates
//! back to this instance, plus the optional `x-functions-key` API key.

pub mod types;

use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::contract::types::RoundResponse;
use self::types::{MarketUpdate, SymbolInfo};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const FUNCTIONS_KEY_HEADER: &str = "x-functions-key";
const USER_ID_HEADER: &str = "X-UserId";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {endpoint}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

/// Client for the markets REST service.
pub struct MarketsApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    client_id: String,
}

impl MarketsApi {
    /// Create a client with a fresh random instance identity.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client_id(base_url, api_key, Uuid::new_v4().to_string())
    }

    /// Create a client with an explicit instance identity. Reusing an
    /// identity across instances makes the server treat them as one
    /// subscriber.
    pub fn with_client_id(
        base_url: impl Into<String>,
        api_key: Option<String>,
        client_id: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            client_id,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let api_key = if config.api.api_key.is_empty() {
            None
        } else {
            Some(config.api.api_key.clone())
        };
        Self::new(config.api_url(), api_key)
    }

    /// The stable per-instance identity sent as `X-UserId`.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List all symbols known to the directory.
    pub async fn symbols(&self) -> Result<Vec<SymbolInfo>, ApiError> {
        self.get_json("symbols").await
    }

    /// Resolve a symbol to its contract address. An unknown symbol is an
    /// expected condition and yields `None`, not an error.
    pub async fn resolve_contract_address(
        &self,
        symbol: &str,
    ) -> Result<Option<String>, ApiError> {
        let symbols = self.symbols().await?;
        Ok(find_symbol(&symbols, symbol).map(|info| info.contract_address.clone()))
    }

    /// Fetch a round of a symbol by its open height.
    pub async fn round_by_height(
        &self,
        symbol: &str,
        open_height: u64,
    ) -> Result<Vec<RoundResponse>, ApiError> {
        self.get_json(&format!("rounds/{symbol}/{open_height}")).await
    }

    /// Fetch the most recent rounds of a symbol.
    pub async fn last_rounds(
        &self,
        symbol: &str,
        count: u32,
    ) -> Result<Vec<RoundResponse>, ApiError> {
        self.get_json(&format!("rounds/{symbol}/?count={count}")).await
    }

    /// Fetch the latest indexed state of a market.
    pub async fn market_state(&self, symbol: &str) -> Result<Vec<MarketUpdate>, ApiError> {
        self.get_json(&format!("market/{symbol}")).await
    }

    /// Publish a market snapshot. The service fans it out to every client
    /// currently subscribed to the symbol.
    pub async fn update_market(&self, update: &MarketUpdate) -> Result<(), ApiError> {
        let resp = self
            .request(reqwest::Method::PUT, "market")
            .json(update)
            .send()
            .await?;
        self.check_status("market", &resp)?;
        Ok(())
    }

    /// Register this client identity for pushed updates of a symbol.
    /// Idempotent server-side; subscribing twice is harmless.
    pub async fn subscribe(&self, symbol: &str) -> Result<(), ApiError> {
        let endpoint = format!("subscribe/{symbol}");
        let resp = self.request(reqwest::Method::GET, &endpoint).send().await?;
        self.check_status(&endpoint, &resp)?;
        debug!(symbol = symbol, client_id = %self.client_id, "subscribed");
        Ok(())
    }

    /// Deregister this client identity for a symbol. Pushes already in
    /// flight may still be delivered.
    pub async fn unsubscribe(&self, symbol: &str) -> Result<(), ApiError> {
        let endpoint = format!("unsubscribe/{symbol}");
        let resp = self.request(reqwest::Method::GET, &endpoint).send().await?;
        self.check_status(&endpoint, &resp)?;
        debug!(symbol = symbol, client_id = %self.client_id, "unsubscribed");
        Ok(())
    }

    fn request(&self, method: reqwest::Method, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let mut req = self
            .client
            .request(method, url)
            .timeout(REQUEST_TIMEOUT)
            .header("Accept", "application/json")
            .header(USER_ID_HEADER, &self.client_id);
        if let Some(key) = &self.api_key {
            req = req.header(FUNCTIONS_KEY_HEADER, key);
        }
        req
    }

    fn check_status(&self, endpoint: &str, resp: &reqwest::Response) -> Result<(), ApiError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
            });
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let resp = self.request(reqwest::Method::GET, endpoint).send().await?;
        self.check_status(endpoint, &resp)?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// Exact-match lookup in a symbol listing.
fn find_symbol<'a>(symbols: &'a [SymbolInfo], symbol: &str) -> Option<&'a SymbolInfo> {
    symbols.iter().find(|info| info.symbol == symbol)
}
