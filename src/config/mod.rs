/*
 * Configuration management for the spyglass service
 */

use crate::models::{Result, SpyglassError};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub subgraph: SubgraphConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubgraphConfig {
    /// Exchange subgraph endpoint (tokens, pairs, day data, bundles).
    pub exchange_url: String,
    /// Blocks subgraph endpoint (timestamp-to-block resolution).
    pub blocks_url: String,
    pub network: Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Shibarium,
    Puppynet,
}

impl Network {
    #[must_use]
    pub fn chain_id(self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Shibarium => 109,
            Network::Puppynet => 157,
        }
    }

    /// Whether the network's exchange subgraph indexes per-day buy/sell
    /// transaction counts.
    #[must_use]
    pub fn tracks_buy_sell_counts(self) -> bool {
        !matches!(self, Network::Mainnet)
    }
}

impl std::str::FromStr for Network {
    type Err = SpyglassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "shibarium" => Ok(Network::Shibarium),
            "puppynet" => Ok(Network::Puppynet),
            _ => Err(SpyglassError::ConfigError(format!("Unknown network: {s}"))),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|e| SpyglassError::ConfigError(format!("Invalid port: {e}")))?,
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            subgraph: SubgraphConfig {
                exchange_url: env::var("EXCHANGE_SUBGRAPH_URL").map_err(|_| {
                    SpyglassError::ConfigError("EXCHANGE_SUBGRAPH_URL not set".to_string())
                })?,
                blocks_url: env::var("BLOCKS_SUBGRAPH_URL").map_err(|_| {
                    SpyglassError::ConfigError("BLOCKS_SUBGRAPH_URL not set".to_string())
                })?,
                network: env::var("NETWORK")
                    .unwrap_or_else(|_| "mainnet".to_string())
                    .parse()?,
            },
        })
    }
}
