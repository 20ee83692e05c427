// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Loading the currency registry from a subgraph.
//!
//! The loader fetches the ETH/USD price from the subgraph bundle, then every token with its
//! recent hourly USD prices through the batch protocol of [`PagedQuery`]. A token's spot price
//! is its `derivedETH` ratio times the ETH/USD price.

use std::{str::FromStr, sync::Arc};

use log::{info, warn};
use prism_model::{
    registry::CurrencyRegistry,
    types::{Amount, Currency, UsdPrice},
};
use prism_network::retry::RetryManager;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use ustr::Ustr;

use super::tokens::TOKENS_ENTITY;
use crate::{
    builder::{MAX_PAGE_SIZE, QueryDocument},
    column::ColumnDescriptor,
    descriptor::{EntityDescriptor, RowMapper},
    enums::ColumnDataType,
    error::{ExecutorError, QueryError},
    executor::QueryExecutor,
    paged::{PagedQuery, PagedQueryConfig},
    row::{Cell, Row, entity_i64, entity_str},
};

/// The query returning the ETH/USD price of the subgraph bundle.
pub const ETH_PRICE_QUERY: &str = r#"query { bundle(id: "1") { ethPriceUSD } }"#;

/// The default number of hourly prices loaded per token (one week).
pub const DEFAULT_TOKEN_HOUR_DATA_LIMIT: usize = 168;

/// Configuration for [`load_currency_registry`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CurrencyLoadConfig {
    /// The number of tokens per batch.
    pub page_size: usize,
    /// The number of most recent hourly prices loaded per token.
    pub token_hour_data_limit: usize,
    /// Retry configuration for the price and token fetches.
    pub query: PagedQueryConfig,
}

impl Default for CurrencyLoadConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            token_hour_data_limit: DEFAULT_TOKEN_HOUR_DATA_LIMIT,
            query: PagedQueryConfig::default(),
        }
    }
}

/// Returns the descriptor used to load currencies, selecting recent hourly prices per token.
///
/// # Panics
///
/// Panics if the static column set is invalid, which would be a programming error.
#[must_use]
pub fn currency_descriptor(token_hour_data_limit: usize) -> EntityDescriptor {
    let body = format!(
        "id symbol name decimals derivedETH tokenHourData(first: {}, orderBy: periodStartUnix, orderDirection: desc) {{ periodStartUnix priceUSD }}",
        token_hour_data_limit.clamp(1, MAX_PAGE_SIZE)
    );
    let columns = vec![
        ColumnDescriptor::new("id", "Address", ColumnDataType::Id),
        ColumnDescriptor::new("symbol", "Symbol", ColumnDataType::Text),
        ColumnDescriptor::new("name", "Name", ColumnDataType::Text),
        ColumnDescriptor::new("decimals", "Decimals", ColumnDataType::BigInt),
        ColumnDescriptor::new("priceUSD", "Price", ColumnDataType::Amount),
    ];
    let row_mapper: RowMapper = Arc::new(|entity: &Value| -> anyhow::Result<Row> {
        let currency = currency_from_entity(entity, None)?;
        Ok(currency_row(&currency))
    });

    EntityDescriptor::new(TOKENS_ENTITY, &body, columns, row_mapper)
}

/// Returns the table row of `currency` with its spot price in USD.
#[must_use]
pub fn currency_row(currency: &Currency) -> Row {
    let price = currency
        .spot_price
        .map(|price| Amount::from_raw(price.raw, Currency::USD()));

    let mut row = Row::new();
    row.insert(Ustr::from("id"), Cell::Text(currency.id.to_string()));
    row.insert(Ustr::from("symbol"), Cell::Text(currency.symbol.to_string()));
    row.insert(Ustr::from("name"), Cell::Text(currency.name.to_string()));
    row.insert(Ustr::from("decimals"), Cell::Integer(i64::from(currency.precision)));
    row.insert(Ustr::from("priceUSD"), Cell::from(price));
    row
}

/// Converts a token entity into a [`Currency`].
///
/// The spot price is derived when `eth_price` is given. Hourly entries which cannot be parsed
/// are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the id, symbol, name or decimals are missing or invalid.
pub fn currency_from_entity(entity: &Value, eth_price: Option<UsdPrice>) -> anyhow::Result<Currency> {
    let id = entity_str(entity, "id")?;
    let symbol = entity_str(entity, "symbol")?;
    let name = entity_str(entity, "name")?;
    let decimals = entity_i64(entity, "decimals")?;
    let precision = u8::try_from(decimals)
        .map_err(|_| anyhow::anyhow!("invalid decimals {decimals} for token {id}"))?;

    let mut currency = Currency::new_checked(id, symbol, name, precision)?;

    if let Some(eth_price) = eth_price {
        // derivedETH is the token price in ETH at the USD price scale
        let derived_eth = entity_str(entity, "derivedETH").and_then(UsdPrice::from_str);
        match derived_eth.map(|ratio| ratio.checked_mul(&eth_price)) {
            Ok(Some(price)) => currency = currency.with_spot_price(price),
            Ok(None) => warn!("Spot price of {symbol} ({id}) overflowed"),
            Err(e) => warn!("No spot price for {symbol} ({id}): {e}"),
        }
    }

    if let Some(Value::Array(hours)) = entity.get("tokenHourData") {
        let series: Vec<(i64, UsdPrice)> = hours
            .iter()
            .filter_map(|hour| match parse_hour(hour) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping hourly price of {symbol} ({id}): {e}");
                    None
                }
            })
            .collect();
        currency = currency.with_hourly_prices(series);
    }

    Ok(currency)
}

fn parse_hour(hour: &Value) -> anyhow::Result<(i64, UsdPrice)> {
    let start = entity_i64(hour, "periodStartUnix")?;
    let price = UsdPrice::from_str(entity_str(hour, "priceUSD")?)?;
    Ok((start, price))
}

/// Parses the ETH/USD price from the `data` of [`ETH_PRICE_QUERY`].
///
/// Returns `None` if the bundle is missing or its price is invalid.
#[must_use]
pub fn parse_eth_price(data: &Value) -> Option<UsdPrice> {
    let bundle = data.get("bundle").filter(|bundle| !bundle.is_null())?;
    match entity_str(bundle, "ethPriceUSD").and_then(UsdPrice::from_str) {
        Ok(price) => Some(price),
        Err(e) => {
            warn!("Invalid ETH price in bundle: {e}");
            None
        }
    }
}

/// Loads every token of the subgraph into a [`CurrencyRegistry`].
///
/// Tokens which cannot be converted are skipped with a warning. On cancellation the registry
/// holds the tokens loaded so far.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a fetch exhausts its retries.
pub async fn load_currency_registry(
    executor: Arc<dyn QueryExecutor>,
    config: &CurrencyLoadConfig,
    cancellation_token: &CancellationToken,
) -> Result<CurrencyRegistry, QueryError> {
    let eth_price = fetch_eth_price(executor.as_ref(), config, cancellation_token).await?;
    if eth_price.is_none() {
        warn!("ETH price unavailable, loading currencies without spot prices");
    }

    let mut query = PagedQuery::new_checked(
        currency_descriptor(config.token_hour_data_limit),
        executor,
        config.query.clone(),
    )
    .map_err(|e| QueryError::Configuration(e.to_string()))?;
    query.set_page_size(config.page_size);

    let entities = query.fetch_all_raw(cancellation_token).await?;
    let currencies: Vec<Currency> = entities
        .iter()
        .filter_map(|entity| match currency_from_entity(entity, eth_price) {
            Ok(currency) => Some(currency),
            Err(e) => {
                warn!("Skipping token {}: {e}", entity.get("id").unwrap_or(&Value::Null));
                None
            }
        })
        .collect();

    info!(
        "Loaded {} currencies from {} tokens",
        currencies.len(),
        entities.len()
    );
    Ok(CurrencyRegistry::new(currencies))
}

async fn fetch_eth_price(
    executor: &dyn QueryExecutor,
    config: &CurrencyLoadConfig,
    cancellation_token: &CancellationToken,
) -> Result<Option<UsdPrice>, QueryError> {
    let retry_manager = RetryManager::new(config.query.fetch_retry.clone())
        .map_err(|e| QueryError::Configuration(e.to_string()))?;
    let document = QueryDocument {
        query: ETH_PRICE_QUERY.to_string(),
        variables: Value::Object(Map::new()),
    };
    let document = &document;

    let result = retry_manager
        .execute_with_retry_with_cancel(
            "fetch ETH price",
            move || executor.execute(document),
            ExecutorError::is_retryable,
            ExecutorError::from_retry_message,
            cancellation_token,
        )
        .await;

    match result {
        Ok(data) => Ok(parse_eth_price(&data)),
        Err(ExecutorError::Canceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn weth_entity() -> Value {
        json!({
            "id": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
            "symbol": "WETH",
            "name": "Wrapped Ether",
            "decimals": "18",
            "derivedETH": "1",
            "tokenHourData": [
                {"periodStartUnix": 1_707_577_200, "priceUSD": "2501.5"},
                {"periodStartUnix": 1_707_573_600, "priceUSD": "2490"},
                {"periodStartUnix": 1_707_570_000, "priceUSD": "not a price"},
            ],
        })
    }

    #[rstest]
    fn test_currency_from_entity() {
        let eth_price = UsdPrice::from_str("2500").unwrap();
        let currency = currency_from_entity(&weth_entity(), Some(eth_price)).unwrap();

        assert_eq!(currency.symbol.as_str(), "WETH");
        assert_eq!(currency.precision, 18);
        assert_eq!(currency.spot_price, Some(eth_price));

        let hourly = currency.hourly_prices.as_ref().unwrap();
        assert_eq!(hourly.len(), 2);
        assert_eq!(
            hourly.get(&1_707_573_600),
            Some(&UsdPrice::from_str("2490").unwrap())
        );
    }

    #[rstest]
    fn test_currency_from_entity_derives_spot_price() {
        let mut entity = weth_entity();
        entity["derivedETH"] = json!("0.0004");
        let eth_price = UsdPrice::from_str("2500").unwrap();

        let currency = currency_from_entity(&entity, Some(eth_price)).unwrap();
        assert_eq!(currency.spot_price, Some(UsdPrice::from_str("1").unwrap()));
    }

    #[rstest]
    fn test_currency_from_entity_without_eth_price() {
        let currency = currency_from_entity(&weth_entity(), None).unwrap();
        assert!(currency.spot_price.is_none());
    }

    #[rstest]
    #[case(json!({"id": "0x1", "symbol": "AAA", "name": "A", "decimals": "256"}))]
    #[case(json!({"id": "0x1", "symbol": "AAA", "name": "A", "decimals": "-1"}))]
    #[case(json!({"id": "0x1", "symbol": "USD", "name": "Fake", "decimals": "6"}))]
    #[case(json!({"id": "0x1", "symbol": "", "name": "A", "decimals": "6"}))]
    #[case(json!({"id": "0x1", "name": "A", "decimals": "6"}))]
    fn test_currency_from_entity_invalid(#[case] entity: Value) {
        assert!(currency_from_entity(&entity, None).is_err());
    }

    #[rstest]
    #[case(json!({"bundle": {"ethPriceUSD": "2500.25"}}), Some("2500.25"))]
    #[case(json!({"bundle": null}), None)]
    #[case(json!({}), None)]
    #[case(json!({"bundle": {"ethPriceUSD": "-1"}}), None)]
    fn test_parse_eth_price(#[case] data: Value, #[case] expected: Option<&str>) {
        let expected = expected.map(|price| UsdPrice::from_str(price).unwrap());
        assert_eq!(parse_eth_price(&data), expected);
    }

    #[rstest]
    fn test_currency_row() {
        let currency = Currency::new("0x1", "AAA", "Token A", 6)
            .with_spot_price(UsdPrice::from_str("1.5").unwrap());
        let row = currency_row(&currency);

        assert_eq!(row[&Ustr::from("decimals")], Cell::Integer(6));
        assert_eq!(row[&Ustr::from("priceUSD")].to_string(), "$1.50");
        assert!(currency_row(&Currency::new("0x2", "BBB", "B", 6))[&Ustr::from("priceUSD")].is_empty());
    }

    #[rstest]
    fn test_currency_descriptor_body_limits_hour_data() {
        let descriptor = currency_descriptor(24);
        assert!(descriptor.body.contains("tokenHourData(first: 24"));
        assert_eq!(descriptor.columns.len(), 5);
    }
}
