/*
 * Data models and error types for the spyglass analytics service
 */

use chrono::{DateTime, Utc};
use ethers_core::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpyglassError {
    #[error("Query construction error: {0}")]
    QueryError(String),

    #[error("Subgraph error: {0}")]
    SubgraphError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpyglassError>;

/// Serde adapter for The Graph's `BigInt` scalar, which arrives as a JSON
/// string.
pub(crate) mod big_int {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }
}

pub(crate) mod big_int_option {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&value.to_string()),
            None => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSummary {
    pub id: Address,
    pub symbol: String,
    pub name: String,
    #[serde(rename = "volumeUSD", with = "rust_decimal::serde::str")]
    pub volume_usd: Decimal,
    #[serde(rename = "dayData", default)]
    pub day_data: Vec<TokenDayData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDayData {
    pub date: i64,
    #[serde(rename = "priceUSD", with = "rust_decimal::serde::str")]
    pub price_usd: Decimal,
    #[serde(rename = "volumeUSD", with = "rust_decimal::serde::str")]
    pub volume_usd: Decimal,
    #[serde(rename = "txCount", with = "big_int")]
    pub tx_count: u64,
    // Only indexed on networks that track per-day buy/sell counts.
    #[serde(rename = "buytxn", default, with = "big_int_option", skip_serializing_if = "Option::is_none")]
    pub buy_tx_count: Option<u64>,
    #[serde(rename = "selltxn", default, with = "big_int_option", skip_serializing_if = "Option::is_none")]
    pub sell_tx_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPage {
    pub tokens: Vec<TokenSummary>,
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairTokenInfo {
    pub id: Address,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSummary {
    pub name: String,
    #[serde(rename = "token0Price", with = "rust_decimal::serde::str")]
    pub token0_price: Decimal,
    #[serde(rename = "token1Price", with = "rust_decimal::serde::str")]
    pub token1_price: Decimal,
    #[serde(rename = "totalSupply", with = "rust_decimal::serde::str")]
    pub total_supply: Decimal,
    #[serde(rename = "txCount", with = "big_int")]
    pub tx_count: u64,
    #[serde(rename = "volumeToken0", with = "rust_decimal::serde::str")]
    pub volume_token0: Decimal,
    #[serde(rename = "volumeToken1", with = "rust_decimal::serde::str")]
    pub volume_token1: Decimal,
    #[serde(rename = "volumeUSD", with = "rust_decimal::serde::str")]
    pub volume_usd: Decimal,
    #[serde(rename = "reserveUSD", with = "rust_decimal::serde::str")]
    pub reserve_usd: Decimal,
    #[serde(rename = "untrackedVolumeUSD", with = "rust_decimal::serde::str")]
    pub untracked_volume_usd: Decimal,
    #[serde(rename = "dayData", default)]
    pub day_data: Vec<PairDayData>,
    pub token0: PairTokenInfo,
    pub token1: PairTokenInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairDayData {
    pub date: i64,
    #[serde(rename = "volumeUSD", with = "rust_decimal::serde::str")]
    pub volume_usd: Decimal,
    #[serde(rename = "txCount", with = "big_int")]
    pub tx_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairPage {
    pub pairs: Vec<PairSummary>,
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub id: Address,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "derivedETH", with = "rust_decimal::serde::str")]
    pub derived_eth: Decimal,
    #[serde(rename = "tradeVolume", with = "rust_decimal::serde::str")]
    pub trade_volume: Decimal,
    #[serde(rename = "tradeVolumeUSD", with = "rust_decimal::serde::str")]
    pub trade_volume_usd: Decimal,
    #[serde(rename = "untrackedVolumeUSD", with = "rust_decimal::serde::str")]
    pub untracked_volume_usd: Decimal,
    #[serde(rename = "totalLiquidity", with = "rust_decimal::serde::str")]
    pub total_liquidity: Decimal,
    #[serde(rename = "txCount", with = "big_int")]
    pub tx_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairTokenSnapshot {
    pub id: Address,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "totalLiquidity", with = "rust_decimal::serde::str")]
    pub total_liquidity: Decimal,
    #[serde(rename = "derivedETH", with = "rust_decimal::serde::str")]
    pub derived_eth: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSnapshot {
    pub id: Address,
    #[serde(rename = "txCount", with = "big_int")]
    pub tx_count: u64,
    pub token0: PairTokenSnapshot,
    pub token1: PairTokenSnapshot,
    #[serde(with = "rust_decimal::serde::str")]
    pub reserve0: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub reserve1: Decimal,
    #[serde(rename = "reserveUSD", with = "rust_decimal::serde::str")]
    pub reserve_usd: Decimal,
    #[serde(rename = "totalSupply", with = "rust_decimal::serde::str")]
    pub total_supply: Decimal,
    #[serde(rename = "trackedReserveETH", with = "rust_decimal::serde::str")]
    pub tracked_reserve_eth: Decimal,
    #[serde(rename = "reserveETH", with = "rust_decimal::serde::str")]
    pub reserve_eth: Decimal,
    #[serde(rename = "volumeUSD", with = "rust_decimal::serde::str")]
    pub volume_usd: Decimal,
    #[serde(rename = "untrackedVolumeUSD", with = "rust_decimal::serde::str")]
    pub untracked_volume_usd: Decimal,
    #[serde(rename = "token0Price", with = "rust_decimal::serde::str")]
    pub token0_price: Decimal,
    #[serde(rename = "token1Price", with = "rust_decimal::serde::str")]
    pub token1_price: Decimal,
    #[serde(rename = "createdAtTimestamp", with = "big_int")]
    pub created_at_timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOverview {
    #[serde(rename = "pairCount", with = "big_int")]
    pub pair_count: u64,
    #[serde(rename = "tokenCount", with = "big_int")]
    pub token_count: u64,
    #[serde(rename = "volumeUSD", with = "rust_decimal::serde::str")]
    pub volume_usd: Decimal,
    #[serde(rename = "liquidityUSD", with = "rust_decimal::serde::str")]
    pub liquidity_usd: Decimal,
    #[serde(rename = "txCount", with = "big_int")]
    pub tx_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub block_number: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub derived_eth: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub eth_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_usd: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub overview: MarketOverview,
    pub liquidity: Vec<ChartPoint>,
    pub volume: Vec<ChartPoint>,
}
