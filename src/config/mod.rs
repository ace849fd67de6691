use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

/// Deployment environment the SDK talks to. Selects the default REST base
/// URL; individual URLs can still be overridden in [`ApiConfig`] and
/// [`HubConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Localterra,
}

impl Network {
    pub fn api_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.updownmarkets.io/mainnet",
            Network::Testnet => "https://api.updownmarkets.io/testnet",
            Network::Localterra => "http://localhost:7071/api/localterra",
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "localterra" => Ok(Network::Localterra),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Localterra => write!(f, "localterra"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_network")]
    pub network: Network,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Overrides the network's default REST base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Service API key (`x-functions-key`) - loaded from env UPDOWN_API_KEY
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Overrides the WebSocket URL derived from the REST base URL.
    #[serde(default)]
    pub ws_url: Option<String>,
    /// Replay REST subscriptions after an automatic reconnect. Whether the
    /// server keeps a client identity's subscriptions across a dropped
    /// connection is not observable from here, so the default replays them.
    #[serde(default = "default_true")]
    pub resubscribe_on_reconnect: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_network() -> Network {
    Network::Testnet
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: String::new(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            ws_url: None,
            resubscribe_on_reconnect: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load config from a TOML file, then overlay environment variables for
    /// secrets and environment selection.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Env-only config (no file needed).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config {
            network: default_network(),
            api: ApiConfig::default(),
            hub: HubConfig::default(),
            logging: LoggingConfig::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(network) = std::env::var("UPDOWN_NETWORK") {
            self.network = network.parse()?;
        }
        if let Ok(key) = std::env::var("UPDOWN_API_KEY") {
            self.api.api_key = key;
        }
        if let Ok(url) = std::env::var("UPDOWN_API_URL") {
            self.api.base_url = Some(url);
        }
        if let Ok(url) = std::env::var("UPDOWN_WS_URL") {
            self.hub.ws_url = Some(url);
        }
        Ok(())
    }

    /// The effective REST base URL: explicit override or the network
    /// default.
    pub fn api_url(&self) -> String {
        self.api
            .base_url
            .clone()
            .unwrap_or_else(|| self.network.api_url().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_urls() {
        assert!(Network::Mainnet.api_url().ends_with("/mainnet"));
        assert!(Network::Localterra.api_url().starts_with("http://localhost"));
    }

    #[test]
    fn parses_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            network = "localterra"

            [hub]
            resubscribe_on_reconnect = false
            "#,
        )
        .unwrap();
        assert_eq!(config.network, Network::Localterra);
        assert!(!config.hub.resubscribe_on_reconnect);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.api_url(), "http://localhost:7071/api/localterra");
    }

    #[test]
    fn base_url_override_wins() {
        let config: Config = toml::from_str(
            r#"
            network = "mainnet"

            [api]
            base_url = "https://staging.example.com/api"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_url(), "https://staging.example.com/api");
    }

    #[test]
    fn unknown_network_is_an_error() {
        assert!(matches!(
            "classic".parse::<Network>(),
            Err(ConfigError::UnknownNetwork(_))
        ));
    }
}
