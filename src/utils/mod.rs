/*
 * Utility functions and helpers
 */

use crate::models::{Result, SpyglassError};
use chrono::{DateTime, Utc};
use ethers_core::types::Address;
use std::str::FromStr;

pub fn parse_address(address: &str) -> Result<Address> {
    if !address.starts_with("0x") || address.len() != 42 {
        return Err(SpyglassError::QueryError(format!(
            "Invalid address format: {address}"
        )));
    }
    Address::from_str(address)
        .map_err(|e| SpyglassError::QueryError(format!("Invalid address {address}: {e}")))
}

#[must_use]
pub fn format_address(address: &Address) -> String {
    format!("{address:?}")
}

pub fn datetime_from_unix(timestamp: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| SpyglassError::SubgraphError(format!("Timestamp out of range: {timestamp}")))
}
