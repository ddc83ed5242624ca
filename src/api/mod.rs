/*
 * REST API module for the analytics service
 */

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{get, routes, State};
use std::str::FromStr;
use std::sync::Arc;
use tracing::error;

use crate::config::Config;
use crate::models::{
    ChartPoint, Dashboard, PairPage, SpyglassError, TokenDayData, TokenPage, TokenSnapshot,
};
use crate::query::{OrderDirection, PageRequest, PairKey, ScaleRequest};
use crate::service::AnalyticsService;
use crate::utils;

pub struct ApiState {
    pub config: Config,
    pub service: Arc<AnalyticsService>,
}

type ApiResult<T> = std::result::Result<Json<T>, Custom<String>>;

fn error_response(error: &SpyglassError) -> Custom<String> {
    error!("Request failed: {error}");
    let status = match error {
        SpyglassError::QueryError(_) => Status::BadRequest,
        _ => Status::InternalServerError,
    };
    Custom(status, error.to_string())
}

fn page_request(
    page: Option<u32>,
    rows_per_page: Option<u32>,
    order_by: Option<String>,
    order_direction: Option<String>,
    search: Option<String>,
    default_order: &str,
) -> std::result::Result<PageRequest, Custom<String>> {
    let direction = match order_direction {
        Some(raw) => OrderDirection::from_str(&raw).map_err(|e| error_response(&e))?,
        None => OrderDirection::Desc,
    };
    let mut request = PageRequest::new(
        page.unwrap_or(0),
        rows_per_page.unwrap_or(25),
        order_by.unwrap_or_else(|| default_order.to_string()),
        direction,
    );
    if let Some(search) = search {
        request = request.with_search(search);
    }
    Ok(request)
}

fn parse_route_address(raw: &str) -> std::result::Result<ethers_core::types::Address, Custom<String>> {
    utils::parse_address(raw).map_err(|e| error_response(&e))
}

#[get("/api/v1/tokens?<page>&<rows_per_page>&<order_by>&<order_direction>&<search>")]
pub async fn get_tokens(
    page: Option<u32>,
    rows_per_page: Option<u32>,
    order_by: Option<String>,
    order_direction: Option<String>,
    search: Option<String>,
    state: &State<ApiState>,
) -> ApiResult<TokenPage> {
    let request = page_request(
        page,
        rows_per_page,
        order_by,
        order_direction,
        search,
        "volumeUSD",
    )?;
    state
        .service
        .token_page(&request)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

#[get("/api/v1/pairs?<page>&<rows_per_page>&<order_by>&<order_direction>&<search>")]
pub async fn get_pairs(
    page: Option<u32>,
    rows_per_page: Option<u32>,
    order_by: Option<String>,
    order_direction: Option<String>,
    search: Option<String>,
    state: &State<ApiState>,
) -> ApiResult<PairPage> {
    let request = page_request(
        page,
        rows_per_page,
        order_by,
        order_direction,
        search,
        "reserveUSD",
    )?;
    state
        .service
        .pair_page(&request)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

#[get("/api/v1/charts/liquidity?<scale>")]
pub async fn get_liquidity_chart(
    scale: Option<u32>,
    state: &State<ApiState>,
) -> ApiResult<Vec<ChartPoint>> {
    let scale = ScaleRequest::new(scale.unwrap_or(30));
    state
        .service
        .liquidity_chart(&scale)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

#[get("/api/v1/charts/volume?<scale>")]
pub async fn get_volume_chart(
    scale: Option<u32>,
    state: &State<ApiState>,
) -> ApiResult<Vec<ChartPoint>> {
    let scale = ScaleRequest::new(scale.unwrap_or(30));
    state
        .service
        .volume_chart(&scale)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

#[get("/api/v1/pairs/<token0>/<token1>/volume?<scale>")]
pub async fn get_pair_volume(
    token0: String,
    token1: String,
    scale: Option<u32>,
    state: &State<ApiState>,
) -> ApiResult<Vec<ChartPoint>> {
    let pair = PairKey {
        token0: parse_route_address(&token0)?,
        token1: parse_route_address(&token1)?,
    };
    let scale = ScaleRequest::new(scale.unwrap_or(7));
    state
        .service
        .pair_volume_history(&pair, &scale)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

#[get("/api/v1/tokens/<address>?<block>")]
pub async fn get_token_snapshot(
    address: String,
    block: Option<u64>,
    state: &State<ApiState>,
) -> ApiResult<TokenSnapshot> {
    let token = parse_route_address(&address)?;
    let snapshot = state
        .service
        .token_snapshot(token, block)
        .await
        .map_err(|e| error_response(&e))?;
    snapshot
        .map(Json)
        .ok_or_else(|| Custom(Status::NotFound, format!("Token not found: {address}")))
}

#[get("/api/v1/tokens/<address>/history?<scale>")]
pub async fn get_token_history(
    address: String,
    scale: Option<u32>,
    state: &State<ApiState>,
) -> ApiResult<Vec<TokenDayData>> {
    let token = parse_route_address(&address)?;
    let scale = ScaleRequest::new(scale.unwrap_or(30));
    state
        .service
        .token_history(token, &scale)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

#[get("/api/v1/overview?<scale>")]
pub async fn get_overview(scale: Option<u32>, state: &State<ApiState>) -> ApiResult<Dashboard> {
    let scale = ScaleRequest::new(scale.unwrap_or(30));
    state
        .service
        .dashboard(&scale)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

#[get("/health")]
pub async fn health_check() -> &'static str {
    "OK"
}

#[must_use]
pub fn create_rocket(state: ApiState) -> rocket::Rocket<rocket::Build> {
    rocket::build().manage(state).mount(
        "/",
        routes![
            get_tokens,
            get_pairs,
            get_liquidity_chart,
            get_volume_chart,
            get_pair_volume,
            get_token_snapshot,
            get_token_history,
            get_overview,
            health_check,
        ],
    )
}
