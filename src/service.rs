/*
 * Analytics service coordinating subgraph queries for market data
 */

use ethers_core::types::Address;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::info;

use crate::{
    client::SubgraphClient,
    config::{Config, Network},
    models::{
        ChartPoint, Dashboard, MarketOverview, PairPage, PairSnapshot, PricePoint, Result,
        SpyglassError, TokenDayData, TokenPage, TokenSnapshot,
    },
    query::{
        self, BlockStamp, Entity, Field, PageRequest, PairKey, ScaleRequest, SeriesSource,
        SnapshotEntity, Value,
    },
    utils,
};

pub struct AnalyticsService {
    exchange: SubgraphClient,
    blocks: SubgraphClient,
    network: Network,
}

impl AnalyticsService {
    pub fn new(config: &Config) -> Result<Self> {
        info!("Initializing analytics service");

        let exchange = SubgraphClient::new(&config.subgraph.exchange_url)?;
        info!("Exchange subgraph client initialized");

        let blocks = SubgraphClient::new(&config.subgraph.blocks_url)?;
        info!("Blocks subgraph client initialized");

        Ok(Self {
            exchange,
            blocks,
            network: config.subgraph.network,
        })
    }

    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    /// One page of the token table, with the global token count for the
    /// pager.
    pub async fn token_page(&self, page: &PageRequest) -> Result<TokenPage> {
        let document = tokens_page::document(page)?;
        let data: tokens_page::Data = self.exchange.query(&document).await?;

        let total_count = data
            .factories
            .first()
            .map(|factory| factory.token_count)
            .unwrap_or_default();
        Ok(TokenPage {
            tokens: data.tokens,
            total_count,
        })
    }

    /// One page of the pair table, with the global pair count for the pager.
    pub async fn pair_page(&self, page: &PageRequest) -> Result<PairPage> {
        let document = pairs_page::document(page)?;
        let data: pairs_page::Data = self.exchange.query(&document).await?;

        let total_count = data
            .factories
            .first()
            .map(|factory| factory.pair_count)
            .unwrap_or_default();
        Ok(PairPage {
            pairs: data.pairs,
            total_count,
        })
    }

    /// The three most active tokens with a `scale`-day history each.
    pub async fn top_tokens(&self, scale: &ScaleRequest) -> Result<Vec<crate::models::TokenSummary>> {
        let document = top_tokens::document(scale, self.network)?;
        let data: top_tokens::Data = self.exchange.query(&document).await?;
        Ok(data.tokens)
    }

    pub async fn liquidity_chart(&self, scale: &ScaleRequest) -> Result<Vec<ChartPoint>> {
        self.factory_chart(scale, "liquidityUSD").await
    }

    pub async fn volume_chart(&self, scale: &ScaleRequest) -> Result<Vec<ChartPoint>> {
        self.factory_chart(scale, "volumeUSD").await
    }

    async fn factory_chart(
        &self,
        scale: &ScaleRequest,
        value_field: &'static str,
    ) -> Result<Vec<ChartPoint>> {
        let document = factory_day_data::document(scale, value_field)?;
        let data: factory_day_data::Data = self.exchange.query(&document).await?;

        let mut points = Vec::new();
        for factory in data.factories {
            for day in factory.day_data {
                points.push(ChartPoint {
                    date: utils::datetime_from_unix(day.date)?,
                    value: day.value(),
                });
            }
        }
        // Day data arrives newest first; charts read left to right.
        points.reverse();
        Ok(points)
    }

    pub async fn pair_volume_history(
        &self,
        pair: &PairKey,
        scale: &ScaleRequest,
    ) -> Result<Vec<ChartPoint>> {
        self.pair_chart(pair, scale, "volumeUSD").await
    }

    pub async fn pair_liquidity_history(
        &self,
        pair: &PairKey,
        scale: &ScaleRequest,
    ) -> Result<Vec<ChartPoint>> {
        self.pair_chart(pair, scale, "reserveUSD").await
    }

    async fn pair_chart(
        &self,
        pair: &PairKey,
        scale: &ScaleRequest,
        value_field: &'static str,
    ) -> Result<Vec<ChartPoint>> {
        let document = pair_day_data::document(pair, scale, value_field)?;
        let data: pair_day_data::Data = self.exchange.query(&document).await?;

        let mut points = Vec::new();
        for pair_days in data.pairs {
            for day in pair_days.day_data {
                points.push(ChartPoint {
                    date: utils::datetime_from_unix(day.date)?,
                    value: day.value(),
                });
            }
        }
        points.reverse();
        Ok(points)
    }

    /// A token's day-data history, newest first.
    pub async fn token_history(
        &self,
        token: Address,
        scale: &ScaleRequest,
    ) -> Result<Vec<TokenDayData>> {
        let document = token_history::document(token, scale)?;
        let data: token_history::Data = self.exchange.query(&document).await?;
        Ok(data.token.map(|token| token.day_data).unwrap_or_default())
    }

    /// Factory-level aggregates, optionally pinned to a historical block.
    pub async fn market_overview(&self, block: Option<u64>) -> Result<MarketOverview> {
        let document = market_overview::document(block)?;
        let data: market_overview::Data = self.exchange.query(&document).await?;
        data.factories.into_iter().next().ok_or_else(|| {
            SpyglassError::SubgraphError("The subgraph returned no factory aggregates".to_string())
        })
    }

    pub async fn token_snapshot(
        &self,
        token: Address,
        block: Option<u64>,
    ) -> Result<Option<TokenSnapshot>> {
        let document = token_snapshot::document(token, block)?;
        let data: token_snapshot::Data = self.exchange.query(&document).await?;
        Ok(data.tokens.into_iter().next())
    }

    pub async fn pair_snapshot(
        &self,
        pair: Address,
        block: Option<u64>,
    ) -> Result<Option<PairSnapshot>> {
        let document = pair_snapshot::document(pair, block)?;
        let data: pair_snapshot::Data = self.exchange.query(&document).await?;
        Ok(data.pairs.into_iter().next())
    }

    /// The ETH price in USD from the bundle entity, optionally pinned to a
    /// historical block.
    pub async fn eth_price(&self, block: Option<u64>) -> Result<Decimal> {
        let document = eth_price::document(block)?;
        let data: eth_price::Data = self.exchange.query(&document).await?;
        data.bundles
            .into_iter()
            .next()
            .map(|bundle| bundle.eth_price)
            .ok_or_else(|| {
                SpyglassError::SubgraphError("The subgraph returned no price bundle".to_string())
            })
    }

    /// USD price of a token at each of the given historical blocks. Blocks
    /// where the token was not yet indexed are skipped.
    pub async fn token_prices_by_block(
        &self,
        token: Address,
        blocks: &[BlockStamp],
    ) -> Result<Vec<PricePoint>> {
        let mut fragments = query::batch_fragments(
            "t",
            SnapshotEntity::Tokens,
            Value::Address(token),
            blocks,
            &[Field::new("derivedETH")],
        )?;
        fragments.extend(query::batch_fragments(
            "b",
            SnapshotEntity::Bundles,
            Value::string("1"),
            blocks,
            &[Field::new("ethPrice")],
        )?);
        let document = query::compose_document("blocks", fragments)?;

        let data: HashMap<String, Option<serde_json::Value>> =
            self.exchange.query(&document).await?;

        let mut points = Vec::with_capacity(blocks.len());
        for block in blocks {
            let token_price: Option<prices::TokenPrice> =
                alias_entry(&data, &format!("t{}", block.timestamp))?;
            let bundle: Option<prices::BundlePrice> =
                alias_entry(&data, &format!("b{}", block.timestamp))?;

            if let (Some(token_price), Some(bundle)) = (token_price, bundle) {
                let timestamp = i64::try_from(block.timestamp).map_err(|_| {
                    SpyglassError::QueryError(format!(
                        "Timestamp out of range: {}",
                        block.timestamp
                    ))
                })?;
                points.push(PricePoint {
                    timestamp: utils::datetime_from_unix(timestamp)?,
                    block_number: block.number,
                    derived_eth: token_price.derived_eth,
                    eth_price: bundle.eth_price,
                    price_usd: token_price.derived_eth * bundle.eth_price,
                });
            }
        }
        Ok(points)
    }

    /// Resolves each timestamp to a block via the blocks subgraph.
    /// Timestamps with no indexed block in their window are skipped.
    pub async fn blocks_for_timestamps(&self, timestamps: &[u64]) -> Result<Vec<BlockStamp>> {
        let document =
            query::blocks_for_timestamps_query(timestamps, vec![Field::new("number")])?;
        let data: HashMap<String, Vec<blocks_lookup::BlockRecord>> =
            self.blocks.query(&document).await?;

        let mut stamps = Vec::with_capacity(timestamps.len());
        for timestamp in timestamps {
            if let Some(record) = data
                .get(&format!("t{timestamp}"))
                .and_then(|records| records.first())
            {
                stamps.push(BlockStamp {
                    timestamp: *timestamp,
                    number: record.number,
                });
            }
        }
        Ok(stamps)
    }

    /// Overview plus liquidity and volume series, fetched concurrently.
    pub async fn dashboard(&self, scale: &ScaleRequest) -> Result<Dashboard> {
        info!("Building dashboard with {} day history", scale.scale);

        let (overview, liquidity, volume) = tokio::try_join!(
            self.market_overview(None),
            self.liquidity_chart(scale),
            self.volume_chart(scale),
        )?;

        Ok(Dashboard {
            overview,
            liquidity,
            volume,
        })
    }
}

fn alias_entry<T: DeserializeOwned>(
    data: &HashMap<String, Option<serde_json::Value>>,
    alias: &str,
) -> Result<Option<T>> {
    match data.get(alias) {
        Some(Some(value)) => Ok(Some(serde_json::from_value(value.clone())?)),
        _ => Ok(None),
    }
}

mod tokens_page {
    use super::*;
    use crate::models::TokenSummary;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    pub(super) fn document(page: &PageRequest) -> Result<QueryDocument> {
        query::list_query(
            Entity::Tokens,
            vec![
                Field::new("id"),
                Field::new("symbol"),
                Field::new("name"),
                Field::new("volumeUSD"),
                Field::new("dayData")
                    .arg("first", Value::Int(7))
                    .arg("orderBy", Value::ident("date"))
                    .arg("orderDirection", Value::ident("desc"))
                    .select(vec![
                        Field::new("priceUSD"),
                        Field::new("volumeUSD"),
                        Field::new("date"),
                        Field::new("txCount"),
                    ]),
            ],
            page,
        )
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub tokens: Vec<TokenSummary>,
        #[serde(default)]
        pub factories: Vec<FactoryCounts>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct FactoryCounts {
        #[serde(rename = "tokenCount", with = "crate::models::big_int")]
        pub token_count: u64,
    }
}

mod pairs_page {
    use super::*;
    use crate::models::PairSummary;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    pub(super) fn document(page: &PageRequest) -> Result<QueryDocument> {
        let token_fields = || {
            vec![
                Field::new("id"),
                Field::new("name"),
                Field::new("symbol"),
            ]
        };
        query::list_query(
            Entity::Pairs,
            vec![
                Field::new("name"),
                Field::new("token0Price"),
                Field::new("token1Price"),
                Field::new("totalSupply"),
                Field::new("txCount"),
                Field::new("volumeToken0"),
                Field::new("volumeToken1"),
                Field::new("volumeUSD"),
                Field::new("reserveUSD"),
                Field::new("untrackedVolumeUSD"),
                Field::new("dayData")
                    .arg("first", Value::Int(2))
                    .arg("orderBy", Value::ident("date"))
                    .arg("orderDirection", Value::ident("desc"))
                    .select(vec![
                        Field::new("txCount"),
                        Field::new("volumeUSD"),
                        Field::new("date"),
                    ]),
                Field::new("token0").select(token_fields()),
                Field::new("token1").select(token_fields()),
            ],
            page,
        )
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub pairs: Vec<PairSummary>,
        #[serde(default)]
        pub factories: Vec<FactoryCounts>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct FactoryCounts {
        #[serde(rename = "pairCount", with = "crate::models::big_int")]
        pub pair_count: u64,
    }
}

mod top_tokens {
    use super::*;
    use crate::models::TokenSummary;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    const TOP_TOKEN_COUNT: u64 = 3;

    pub(super) fn document(scale: &ScaleRequest, network: Network) -> Result<QueryDocument> {
        scale.validate()?;

        let mut day_fields = vec![
            Field::new("priceUSD"),
            Field::new("volumeUSD"),
            Field::new("date"),
            Field::new("txCount"),
        ];
        if network.tracks_buy_sell_counts() {
            day_fields.push(Field::new("buytxn"));
            day_fields.push(Field::new("selltxn"));
        }

        let root = Field::new("tokens")
            .arg("first", Value::Int(TOP_TOKEN_COUNT))
            .arg("orderBy", Value::ident("txCount"))
            .arg("orderDirection", Value::ident("desc"))
            .select(vec![
                Field::new("id"),
                Field::new("symbol"),
                Field::new("name"),
                Field::new("volumeUSD"),
                Field::new("dayData")
                    .arg("first", Value::Int(u64::from(scale.scale)))
                    .arg("orderBy", Value::ident("date"))
                    .arg("orderDirection", Value::ident("desc"))
                    .select(day_fields),
            ]);
        query::compose_document("topTokens", vec![root])
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub tokens: Vec<TokenSummary>,
    }
}

mod factory_day_data {
    use super::*;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    pub(super) fn document(
        scale: &ScaleRequest,
        value_field: &'static str,
    ) -> Result<QueryDocument> {
        query::historical_series_query(
            &SeriesSource::Global,
            scale,
            vec![Field::new(value_field), Field::new("date")],
        )
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub factories: Vec<FactoryDayData>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct FactoryDayData {
        #[serde(rename = "dayData", default)]
        pub day_data: Vec<DayPoint>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct DayPoint {
        pub date: i64,
        #[serde(
            rename = "liquidityUSD",
            default,
            with = "rust_decimal::serde::str_option"
        )]
        pub liquidity_usd: Option<Decimal>,
        #[serde(
            rename = "volumeUSD",
            default,
            with = "rust_decimal::serde::str_option"
        )]
        pub volume_usd: Option<Decimal>,
    }

    impl DayPoint {
        pub(super) fn value(&self) -> Decimal {
            self.liquidity_usd
                .or(self.volume_usd)
                .unwrap_or(Decimal::ZERO)
        }
    }
}

mod pair_day_data {
    use super::*;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    pub(super) fn document(
        pair: &PairKey,
        scale: &ScaleRequest,
        value_field: &'static str,
    ) -> Result<QueryDocument> {
        query::historical_series_query(
            &SeriesSource::Pair(*pair),
            scale,
            vec![Field::new(value_field), Field::new("date")],
        )
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub pairs: Vec<PairDays>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct PairDays {
        #[serde(rename = "dayData", default)]
        pub day_data: Vec<DayPoint>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct DayPoint {
        pub date: i64,
        #[serde(
            rename = "volumeUSD",
            default,
            with = "rust_decimal::serde::str_option"
        )]
        pub volume_usd: Option<Decimal>,
        #[serde(
            rename = "reserveUSD",
            default,
            with = "rust_decimal::serde::str_option"
        )]
        pub reserve_usd: Option<Decimal>,
    }

    impl DayPoint {
        pub(super) fn value(&self) -> Decimal {
            self.volume_usd
                .or(self.reserve_usd)
                .unwrap_or(Decimal::ZERO)
        }
    }
}

mod token_history {
    use super::*;
    use crate::models::TokenDayData;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    pub(super) fn document(token: Address, scale: &ScaleRequest) -> Result<QueryDocument> {
        query::historical_series_query(
            &SeriesSource::Token(token),
            scale,
            vec![
                Field::new("priceUSD"),
                Field::new("volumeUSD"),
                Field::new("date"),
                Field::new("txCount"),
            ],
        )
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub token: Option<TokenDays>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct TokenDays {
        #[serde(rename = "dayData", default)]
        pub day_data: Vec<TokenDayData>,
    }
}

mod market_overview {
    use super::*;
    use crate::models::MarketOverview;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    pub(super) fn document(block: Option<u64>) -> Result<QueryDocument> {
        query::point_in_time_query(
            SnapshotEntity::Factories,
            vec![],
            block,
            vec![
                Field::new("pairCount"),
                Field::new("tokenCount"),
                Field::new("volumeUSD"),
                Field::new("liquidityUSD"),
                Field::new("txCount"),
            ],
        )
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub factories: Vec<MarketOverview>,
    }
}

mod token_snapshot {
    use super::*;
    use crate::models::TokenSnapshot;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    pub(super) fn document(token: Address, block: Option<u64>) -> Result<QueryDocument> {
        query::point_in_time_query(
            SnapshotEntity::Tokens,
            vec![("id".to_string(), Value::Address(token))],
            block,
            vec![
                Field::new("id"),
                Field::new("name"),
                Field::new("symbol"),
                Field::new("derivedETH"),
                Field::new("tradeVolume"),
                Field::new("tradeVolumeUSD"),
                Field::new("untrackedVolumeUSD"),
                Field::new("totalLiquidity"),
                Field::new("txCount"),
            ],
        )
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub tokens: Vec<TokenSnapshot>,
    }
}

mod pair_snapshot {
    use super::*;
    use crate::models::PairSnapshot;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    pub(super) fn document(pair: Address, block: Option<u64>) -> Result<QueryDocument> {
        let token_fields = || {
            vec![
                Field::new("id"),
                Field::new("name"),
                Field::new("symbol"),
                Field::new("totalLiquidity"),
                Field::new("derivedETH"),
            ]
        };
        query::point_in_time_query(
            SnapshotEntity::Pairs,
            vec![("id".to_string(), Value::Address(pair))],
            block,
            vec![
                Field::new("id"),
                Field::new("txCount"),
                Field::new("token0").select(token_fields()),
                Field::new("token1").select(token_fields()),
                Field::new("reserve0"),
                Field::new("reserve1"),
                Field::new("reserveUSD"),
                Field::new("totalSupply"),
                Field::new("trackedReserveETH"),
                Field::new("reserveETH"),
                Field::new("volumeUSD"),
                Field::new("untrackedVolumeUSD"),
                Field::new("token0Price"),
                Field::new("token1Price"),
                Field::new("createdAtTimestamp"),
            ],
        )
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub pairs: Vec<PairSnapshot>,
    }
}

mod eth_price {
    use super::*;
    use crate::query::QueryDocument;
    use serde::Deserialize;

    pub(super) fn document(block: Option<u64>) -> Result<QueryDocument> {
        query::point_in_time_query(
            SnapshotEntity::Bundles,
            vec![("id".to_string(), Value::string("1"))],
            block,
            vec![Field::new("id"), Field::new("ethPrice")],
        )
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Data {
        pub bundles: Vec<Bundle>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Bundle {
        #[serde(rename = "ethPrice", with = "rust_decimal::serde::str")]
        pub eth_price: Decimal,
    }
}

mod prices {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub(super) struct TokenPrice {
        #[serde(rename = "derivedETH", with = "rust_decimal::serde::str")]
        pub derived_eth: Decimal,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct BundlePrice {
        #[serde(rename = "ethPrice", with = "rust_decimal::serde::str")]
        pub eth_price: Decimal,
    }
}

mod blocks_lookup {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub(super) struct BlockRecord {
        #[serde(with = "crate::models::big_int")]
        pub number: u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::OrderDirection;
    use std::str::FromStr;

    fn service(url: &str) -> AnalyticsService {
        AnalyticsService {
            exchange: SubgraphClient::new(url).unwrap(),
            blocks: SubgraphClient::new(url).unwrap(),
            network: Network::Mainnet,
        }
    }

    fn token_address() -> Address {
        Address::from_str("0xfd0205066521550d7d7ab19da8f72bb004b4c341").unwrap()
    }

    #[tokio::test]
    async fn token_page_includes_total_count() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"tokens":[{
                    "id":"0xfd0205066521550d7d7ab19da8f72bb004b4c341",
                    "symbol":"LEASH",
                    "name":"DOGE KILLER",
                    "volumeUSD":"1000.5",
                    "dayData":[]
                }],"factories":[{"tokenCount":"1411"}]}}"#,
            )
            .create_async()
            .await;

        let service = service(&server.url());
        let request = PageRequest::new(0, 10, "volumeUSD", OrderDirection::Desc);
        let page = service.token_page(&request).await.unwrap();

        assert_eq!(page.tokens.len(), 1);
        assert_eq!(page.tokens[0].symbol, "LEASH");
        assert_eq!(page.total_count, 1411);
    }

    #[test]
    fn invalid_page_request_never_reaches_the_network() {
        // Deliberately no mock: a network round trip would error loudly.
        let service = service("http://127.0.0.1:9");
        let request = PageRequest::new(0, 0, "volumeUSD", OrderDirection::Desc);
        let result = tokio_test::block_on(service.token_page(&request));
        assert!(matches!(result, Err(SpyglassError::QueryError(_))));
    }

    #[tokio::test]
    async fn prices_by_block_skips_unindexed_blocks() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{
                    "t1600000000":{"derivedETH":"0.001"},
                    "b1600000000":{"ethPrice":"2000"},
                    "t1600003600":null,
                    "b1600003600":{"ethPrice":"2100"}
                }}"#,
            )
            .create_async()
            .await;

        let service = service(&server.url());
        let blocks = [
            BlockStamp {
                timestamp: 1_600_000_000,
                number: 10_000_000,
            },
            BlockStamp {
                timestamp: 1_600_003_600,
                number: 10_000_270,
            },
        ];
        let points = service
            .token_prices_by_block(token_address(), &blocks)
            .await
            .unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].block_number, 10_000_000);
        assert_eq!(points[0].price_usd.to_string(), "2.000");
    }

    #[tokio::test]
    async fn blocks_for_timestamps_maps_aliases_back() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{
                    "t1600000000":[{"number":"10000000"}],
                    "t1600003600":[]
                }}"#,
            )
            .create_async()
            .await;

        let service = service(&server.url());
        let stamps = service
            .blocks_for_timestamps(&[1_600_000_000, 1_600_003_600])
            .await
            .unwrap();

        assert_eq!(stamps.len(), 1);
        assert_eq!(
            stamps[0],
            BlockStamp {
                timestamp: 1_600_000_000,
                number: 10_000_000,
            }
        );
    }

    #[tokio::test]
    async fn factory_chart_returns_chronological_points() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"factories":[{"dayData":[
                    {"date":1700092800,"liquidityUSD":"2000"},
                    {"date":1700006400,"liquidityUSD":"1000"}
                ]}]}}"#,
            )
            .create_async()
            .await;

        let service = service(&server.url());
        let points = service
            .liquidity_chart(&ScaleRequest::new(2))
            .await
            .unwrap();

        assert_eq!(points.len(), 2);
        assert!(points[0].date < points[1].date);
        assert_eq!(points[0].value.to_string(), "1000");
        assert_eq!(points[1].value.to_string(), "2000");
    }

    #[test]
    fn top_tokens_selection_tracks_network_capabilities() {
        let scale = ScaleRequest::new(30);
        let mainnet = top_tokens::document(&scale, Network::Mainnet).unwrap();
        assert!(!mainnet.as_str().contains("buytxn"));

        let shibarium = top_tokens::document(&scale, Network::Shibarium).unwrap();
        assert!(shibarium.as_str().contains("buytxn"));
        assert!(shibarium.as_str().contains("selltxn"));
    }

    #[test]
    fn eth_price_document_pins_block() {
        let document = eth_price::document(Some(12_345_678)).unwrap();
        assert!(document.as_str().contains("block: { number: 12345678 }"));
        assert!(document.as_str().contains("where: { id: \"1\" }"));

        let unpinned = eth_price::document(None).unwrap();
        assert!(!unpinned.as_str().contains("block"));
    }
}
