/*
 * Query construction layer: turns UI-level filter/sort/pagination parameters
 * into subgraph query documents
 */

mod document;

pub use document::{Document, Field, QueryDocument, Value};

use crate::models::{Result, SpyglassError};
use ethers_core::types::Address;
use std::fmt;
use std::str::FromStr;

/// Window, in seconds, used when resolving a timestamp to a block.
const BLOCK_WINDOW_SECONDS: u64 = 600;

/// Entities exposed through paginated list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Tokens,
    Pairs,
    Transactions,
}

impl Entity {
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Entity::Tokens => "tokens",
            Entity::Pairs => "pairs",
            Entity::Transactions => "transactions",
        }
    }

    /// The text field a search term filters on.
    fn search_field(self) -> Option<&'static str> {
        match self {
            Entity::Tokens => Some("symbol_contains_nocase"),
            Entity::Pairs => Some("name_contains_nocase"),
            Entity::Transactions => None,
        }
    }

    /// The factory-level aggregate count requested alongside a page.
    fn count_field(self) -> Option<&'static str> {
        match self {
            Entity::Tokens => Some("tokenCount"),
            Entity::Pairs => Some("pairCount"),
            Entity::Transactions => None,
        }
    }
}

/// Entities addressable by snapshot and batch-by-block queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotEntity {
    Tokens,
    Pairs,
    Factories,
    Bundles,
}

impl SnapshotEntity {
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            SnapshotEntity::Tokens => "tokens",
            SnapshotEntity::Pairs => "pairs",
            SnapshotEntity::Factories => "factories",
            SnapshotEntity::Bundles => "bundles",
        }
    }

    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            SnapshotEntity::Tokens => "token",
            SnapshotEntity::Pairs => "pair",
            SnapshotEntity::Factories => "factory",
            SnapshotEntity::Bundles => "bundle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderDirection {
    type Err = SpyglassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            _ => Err(SpyglassError::QueryError(format!(
                "Invalid order direction: {s}"
            ))),
        }
    }
}

/// Pagination, sorting, and search parameters for list queries.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub page: u32,
    pub rows_per_page: u32,
    pub order_by: String,
    pub order_direction: OrderDirection,
    pub search: Option<String>,
}

impl PageRequest {
    pub fn new(
        page: u32,
        rows_per_page: u32,
        order_by: impl Into<String>,
        order_direction: OrderDirection,
    ) -> Self {
        Self {
            page,
            rows_per_page,
            order_by: order_by.into(),
            order_direction,
            search: None,
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// The `first` count. The subgraph only offers `first`/`skip`
    /// windowing, and the upstream consumer re-fetches the whole prefix up
    /// to the requested page with `skip: 0` on every call.
    #[must_use]
    pub fn first(&self) -> u64 {
        (u64::from(self.page) + 1) * u64::from(self.rows_per_page)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows_per_page == 0 {
            return Err(SpyglassError::QueryError(
                "rows_per_page must be greater than zero".to_string(),
            ));
        }
        if !document::is_identifier(&self.order_by) {
            return Err(SpyglassError::QueryError(format!(
                "Invalid order field: {}",
                self.order_by
            )));
        }
        Ok(())
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|term| !term.is_empty())
    }
}

/// Number of time-bucketed records requested by a historical series.
#[derive(Debug, Clone, Copy)]
pub struct ScaleRequest {
    pub scale: u32,
}

impl ScaleRequest {
    #[must_use]
    pub fn new(scale: u32) -> Self {
        Self { scale }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scale == 0 {
            return Err(SpyglassError::QueryError(
                "scale must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// A trading pair identified by its two constituent token addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairKey {
    pub token0: Address,
    pub token1: Address,
}

/// A historical block together with the timestamp it was resolved from.
/// The timestamp doubles as the alias seed in batch queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStamp {
    pub timestamp: u64,
    pub number: u64,
}

/// What a historical day-data series is rooted at.
#[derive(Debug, Clone, Copy)]
pub enum SeriesSource {
    Global,
    Token(Address),
    Pair(PairKey),
}

/// Wraps top-level selections into a named document.
pub fn compose_document(name: &str, fields: Vec<Field>) -> Result<QueryDocument> {
    if !document::is_identifier(name) {
        return Err(SpyglassError::QueryError(format!(
            "Invalid query name: {name}"
        )));
    }
    if fields.is_empty() {
        return Err(SpyglassError::QueryError(
            "A query document needs at least one selection".to_string(),
        ));
    }
    Ok(Document::new(name, fields).render())
}

/// Builds a paginated list query for `entity`, requesting `fields` for each
/// row plus the factory-level aggregate count where the entity has one.
pub fn list_query(entity: Entity, fields: Vec<Field>, page: &PageRequest) -> Result<QueryDocument> {
    page.validate()?;
    if fields.is_empty() {
        return Err(SpyglassError::QueryError(format!(
            "Empty field selection for {}",
            entity.collection()
        )));
    }

    let mut root = Field::new(entity.collection());
    if let Some(term) = page.search_term() {
        let search_field = entity.search_field().ok_or_else(|| {
            SpyglassError::QueryError(format!(
                "{} do not support text search",
                entity.collection()
            ))
        })?;
        root = root.arg(
            "where",
            Value::Object(vec![(search_field.to_string(), Value::string(term))]),
        );
    }
    root = root
        .arg("first", Value::Int(page.first()))
        .arg("skip", Value::Int(0))
        .arg("orderBy", Value::ident(page.order_by.as_str()))
        .arg("orderDirection", Value::ident(page.order_direction.as_str()))
        .select(fields);

    let mut selections = vec![root];
    if let Some(count_field) = entity.count_field() {
        selections.push(Field::new("factories").select(vec![Field::new(count_field)]));
    }
    compose_document(entity.collection(), selections)
}

/// Builds a query for the most recent `scale` day-bucketed records, newest
/// first, rooted at the factory, a token, or a pair.
pub fn historical_series_query(
    source: &SeriesSource,
    scale: &ScaleRequest,
    fields: Vec<Field>,
) -> Result<QueryDocument> {
    scale.validate()?;
    if fields.is_empty() {
        return Err(SpyglassError::QueryError(
            "Empty field selection for day data".to_string(),
        ));
    }

    let day_data = Field::new("dayData")
        .arg("first", Value::Int(u64::from(scale.scale)))
        .arg("orderBy", Value::ident("date"))
        .arg("orderDirection", Value::ident("desc"))
        .select(fields);

    let root = match source {
        SeriesSource::Global => Field::new("factories").select(vec![day_data]),
        SeriesSource::Token(address) => Field::new("token")
            .arg("id", Value::Address(*address))
            .select(vec![day_data]),
        SeriesSource::Pair(pair) => Field::new("pairs")
            .arg(
                "where",
                Value::Object(vec![
                    ("token0".to_string(), Value::Address(pair.token0)),
                    ("token1".to_string(), Value::Address(pair.token1)),
                ]),
            )
            .select(vec![day_data]),
    };
    compose_document("dayDataSeries", vec![root])
}

/// Builds a snapshot query for `entity` rows matching `filter`, pinned to
/// `block` when one is given and the latest indexed state otherwise.
pub fn point_in_time_query(
    entity: SnapshotEntity,
    filter: Vec<(String, Value)>,
    block: Option<u64>,
    fields: Vec<Field>,
) -> Result<QueryDocument> {
    if fields.is_empty() {
        return Err(SpyglassError::QueryError(format!(
            "Empty field selection for {}",
            entity.collection()
        )));
    }
    for (key, _) in &filter {
        if !document::is_identifier(key) {
            return Err(SpyglassError::QueryError(format!(
                "Invalid filter field: {key}"
            )));
        }
    }

    let mut root = Field::new(entity.collection());
    if let Some(number) = block {
        root = root.arg(
            "block",
            Value::Object(vec![("number".to_string(), Value::Int(number))]),
        );
    }
    if !filter.is_empty() {
        root = root.arg("where", Value::Object(filter));
    }
    compose_document(entity.collection(), vec![root.select(fields)])
}

/// Produces one aliased fragment per block, each requesting the same shape
/// for the entity identified by `id` at that block. Aliases are derived from
/// the block timestamp, so distinct inputs get distinct, stable labels.
pub fn batch_fragments(
    alias_prefix: &str,
    entity: SnapshotEntity,
    id: Value,
    blocks: &[BlockStamp],
    fields: &[Field],
) -> Result<Vec<Field>> {
    if !document::is_identifier(alias_prefix) {
        return Err(SpyglassError::QueryError(format!(
            "Invalid alias prefix: {alias_prefix}"
        )));
    }
    if blocks.is_empty() {
        return Err(SpyglassError::QueryError(
            "A batch query needs at least one block".to_string(),
        ));
    }
    if fields.is_empty() {
        return Err(SpyglassError::QueryError(format!(
            "Empty field selection for {}",
            entity.singular()
        )));
    }

    Ok(blocks
        .iter()
        .map(|block| {
            Field::new(entity.singular())
                .aliased(format!("{alias_prefix}{}", block.timestamp))
                .arg("id", id.clone())
                .arg(
                    "block",
                    Value::Object(vec![("number".to_string(), Value::Int(block.number))]),
                )
                .select(fields.to_vec())
        })
        .collect())
}

/// Builds a batch query requesting the same entity snapshot at each of the
/// given historical blocks, one aliased fragment per block.
pub fn batch_by_block_query(
    entity: SnapshotEntity,
    id: Value,
    blocks: &[BlockStamp],
    fields: Vec<Field>,
) -> Result<QueryDocument> {
    let fragments = batch_fragments("t", entity, id, blocks, &fields)?;
    compose_document("blocks", fragments)
}

/// Builds a blocks-subgraph query resolving each timestamp to the newest
/// block inside a fixed window after it.
pub fn blocks_for_timestamps_query(
    timestamps: &[u64],
    fields: Vec<Field>,
) -> Result<QueryDocument> {
    if timestamps.is_empty() {
        return Err(SpyglassError::QueryError(
            "A block lookup needs at least one timestamp".to_string(),
        ));
    }
    if fields.is_empty() {
        return Err(SpyglassError::QueryError(
            "Empty field selection for blocks".to_string(),
        ));
    }

    let fragments = timestamps
        .iter()
        .map(|timestamp| {
            Field::new("blocks")
                .aliased(format!("t{timestamp}"))
                .arg("first", Value::Int(1))
                .arg("orderBy", Value::ident("timestamp"))
                .arg("orderDirection", Value::ident("desc"))
                .arg(
                    "where",
                    Value::Object(vec![
                        ("timestamp_gt".to_string(), Value::Int(*timestamp)),
                        (
                            "timestamp_lt".to_string(),
                            Value::Int(timestamp + BLOCK_WINDOW_SECONDS),
                        ),
                    ]),
                )
                .select(fields.clone())
        })
        .collect();
    compose_document("blocks", fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn address(fill: u8) -> Address {
        Address::from_slice(&[fill; 20])
    }

    /// Test-side extraction of a rendered argument value.
    fn argument<'a>(document: &'a str, name: &str) -> Option<&'a str> {
        let marker = format!("{name}: ");
        let start = document.find(&marker)? + marker.len();
        let rest = &document[start..];
        let end = rest.find([',', ')', '}'])?;
        Some(rest[..end].trim())
    }

    #[test]
    fn list_query_requests_full_prefix_with_zero_skip() {
        for (page, rows) in [(0u32, 1u32), (2, 10), (7, 25), (199, 100)] {
            let request = PageRequest::new(page, rows, "volumeUSD", OrderDirection::Desc);
            let document =
                list_query(Entity::Tokens, vec![Field::new("id")], &request).unwrap();
            let text = document.as_str();

            let first: u64 = argument(text, "first").unwrap().parse().unwrap();
            let skip: u64 = argument(text, "skip").unwrap().parse().unwrap();
            assert_eq!(first, (u64::from(page) + 1) * u64::from(rows));
            assert_eq!(skip, 0);
        }
    }

    #[test]
    fn list_query_matches_reference_rendering() {
        let request = PageRequest::new(2, 10, "volumeUSD", OrderDirection::Desc);
        let document = list_query(
            Entity::Tokens,
            vec![Field::new("id"), Field::new("symbol")],
            &request,
        )
        .unwrap();

        assert!(document.as_str().contains(
            "tokens(first: 30, skip: 0, orderBy: volumeUSD, orderDirection: desc) { id symbol }"
        ));
        assert!(document.as_str().contains("factories { tokenCount }"));
    }

    #[test]
    fn order_direction_round_trips_and_rejects_everything_else() {
        assert_eq!("asc".parse::<OrderDirection>().unwrap(), OrderDirection::Asc);
        assert_eq!(
            "desc".parse::<OrderDirection>().unwrap(),
            OrderDirection::Desc
        );
        for invalid in ["ASC", "Desc", "descending", ""] {
            assert!(invalid.parse::<OrderDirection>().is_err());
        }

        let request = PageRequest::new(0, 5, "reserveUSD", OrderDirection::Asc);
        let document = list_query(Entity::Pairs, vec![Field::new("name")], &request).unwrap();
        assert_eq!(argument(document.as_str(), "orderDirection"), Some("asc"));
    }

    #[test]
    fn search_emits_exactly_one_contains_clause() {
        let without = PageRequest::new(0, 10, "volumeUSD", OrderDirection::Desc);
        let document = list_query(Entity::Tokens, vec![Field::new("id")], &without).unwrap();
        assert!(!document.as_str().contains("where"));

        let empty = without.clone().with_search("");
        let document = list_query(Entity::Tokens, vec![Field::new("id")], &empty).unwrap();
        assert!(!document.as_str().contains("where"));

        let with = without.with_search("SHIB");
        let document = list_query(Entity::Tokens, vec![Field::new("id")], &with).unwrap();
        assert_eq!(document.as_str().matches("_contains_nocase").count(), 1);
        assert!(document
            .as_str()
            .contains("where: { symbol_contains_nocase: \"SHIB\" }"));
    }

    #[test]
    fn search_terms_are_escaped() {
        let request =
            PageRequest::new(0, 10, "volumeUSD", OrderDirection::Desc).with_search("SH\"IB\\");
        let document = list_query(Entity::Tokens, vec![Field::new("id")], &request).unwrap();
        assert!(document
            .as_str()
            .contains("symbol_contains_nocase: \"SH\\\"IB\\\\\""));
    }

    #[test]
    fn search_on_transactions_is_rejected() {
        let request = PageRequest::new(0, 10, "timestamp", OrderDirection::Desc).with_search("x");
        let result = list_query(Entity::Transactions, vec![Field::new("id")], &request);
        assert!(matches!(result, Err(SpyglassError::QueryError(_))));
    }

    #[test]
    fn invalid_page_parameters_fail_fast() {
        let zero_rows = PageRequest::new(0, 0, "volumeUSD", OrderDirection::Desc);
        assert!(list_query(Entity::Tokens, vec![Field::new("id")], &zero_rows).is_err());

        let bad_order = PageRequest::new(0, 10, "volumeUSD) { id }", OrderDirection::Desc);
        assert!(list_query(Entity::Tokens, vec![Field::new("id")], &bad_order).is_err());

        let no_fields = PageRequest::new(0, 10, "volumeUSD", OrderDirection::Desc);
        assert!(list_query(Entity::Tokens, vec![], &no_fields).is_err());
    }

    #[test]
    fn historical_series_orders_newest_first() {
        let document = historical_series_query(
            &SeriesSource::Global,
            &ScaleRequest::new(30),
            vec![Field::new("liquidityUSD"), Field::new("date")],
        )
        .unwrap();

        assert!(document.as_str().contains(
            "factories { dayData(first: 30, orderBy: date, orderDirection: desc) { liquidityUSD date } }"
        ));
        assert!(historical_series_query(
            &SeriesSource::Global,
            &ScaleRequest::new(0),
            vec![Field::new("date")],
        )
        .is_err());
    }

    #[test]
    fn historical_series_filters_to_pair() {
        let pair = PairKey {
            token0: address(0x11),
            token1: address(0x22),
        };
        let document = historical_series_query(
            &SeriesSource::Pair(pair),
            &ScaleRequest::new(7),
            vec![Field::new("volumeUSD"), Field::new("date")],
        )
        .unwrap();

        assert!(document.as_str().contains(
            "pairs(where: { token0: \"0x1111111111111111111111111111111111111111\", token1: \"0x2222222222222222222222222222222222222222\" })"
        ));
    }

    #[test]
    fn point_in_time_query_pins_block_and_filter() {
        let document = point_in_time_query(
            SnapshotEntity::Pairs,
            vec![("id".to_string(), Value::string("0xabc"))],
            Some(12_345_678),
            vec![Field::new("id")],
        )
        .unwrap();

        assert!(document.as_str().contains("block: { number: 12345678 }"));
        assert!(document.as_str().contains("where: { id: \"0xabc\" }"));
    }

    #[test]
    fn point_in_time_query_omits_block_when_unpinned() {
        let document = point_in_time_query(
            SnapshotEntity::Bundles,
            vec![("id".to_string(), Value::string("1"))],
            None,
            vec![Field::new("ethPrice")],
        )
        .unwrap();

        assert!(!document.as_str().contains("block"));
        assert!(document
            .as_str()
            .contains("bundles(where: { id: \"1\" }) { ethPrice }"));
    }

    #[test]
    fn point_in_time_query_rejects_bad_filter_key() {
        let result = point_in_time_query(
            SnapshotEntity::Tokens,
            vec![("id) { }".to_string(), Value::string("x"))],
            None,
            vec![Field::new("id")],
        );
        assert!(matches!(result, Err(SpyglassError::QueryError(_))));
    }

    #[test]
    fn batch_query_emits_one_unique_alias_per_block() {
        let blocks: Vec<BlockStamp> = (0..5)
            .map(|i| BlockStamp {
                timestamp: 1_600_000_000 + i * 3600,
                number: 10_000_000 + i,
            })
            .collect();
        let document = batch_by_block_query(
            SnapshotEntity::Tokens,
            Value::Address(address(0x33)),
            &blocks,
            vec![Field::new("derivedETH")],
        )
        .unwrap();

        let aliases: Vec<&str> = document
            .as_str()
            .lines()
            .filter_map(|line| line.trim().split(':').next())
            .filter(|candidate| candidate.starts_with('t'))
            .collect();
        assert_eq!(aliases.len(), blocks.len());
        let unique: HashSet<&&str> = aliases.iter().collect();
        assert_eq!(unique.len(), blocks.len());
        for block in &blocks {
            assert!(document
                .as_str()
                .contains(&format!("t{}: token(", block.timestamp)));
        }
    }

    #[test]
    fn batch_query_is_deterministic() {
        let blocks = [BlockStamp {
            timestamp: 1_600_000_000,
            number: 10_000_000,
        }];
        let build = || {
            batch_by_block_query(
                SnapshotEntity::Pairs,
                Value::string("0xabc"),
                &blocks,
                vec![Field::new("token0Price")],
            )
            .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn batch_query_rejects_empty_blocks() {
        let result = batch_by_block_query(
            SnapshotEntity::Tokens,
            Value::string("0xabc"),
            &[],
            vec![Field::new("id")],
        );
        assert!(matches!(result, Err(SpyglassError::QueryError(_))));
    }

    #[test]
    fn parameters_round_trip_through_the_document() {
        let request = PageRequest::new(3, 17, "txCount", OrderDirection::Asc);
        let document = list_query(Entity::Pairs, vec![Field::new("name")], &request).unwrap();
        let text = document.as_str();

        assert_eq!(
            argument(text, "first").unwrap().parse::<u64>().unwrap(),
            request.first()
        );
        assert_eq!(argument(text, "skip").unwrap().parse::<u64>().unwrap(), 0);
        assert_eq!(argument(text, "orderBy"), Some("txCount"));
        assert_eq!(argument(text, "orderDirection"), Some("asc"));

        let block = 17_654_321u64;
        let document = point_in_time_query(
            SnapshotEntity::Tokens,
            vec![("id".to_string(), Value::Address(address(0x44)))],
            Some(block),
            vec![Field::new("id")],
        )
        .unwrap();
        assert_eq!(
            argument(document.as_str(), "number")
                .unwrap()
                .parse::<u64>()
                .unwrap(),
            block
        );
    }

    #[test]
    fn blocks_lookup_brackets_each_timestamp() {
        let document =
            blocks_for_timestamps_query(&[1_600_000_000], vec![Field::new("number")]).unwrap();
        assert!(document.as_str().contains(
            "t1600000000: blocks(first: 1, orderBy: timestamp, orderDirection: desc, where: { timestamp_gt: 1600000000, timestamp_lt: 1600000600 }) { number }"
        ));
    }
}
