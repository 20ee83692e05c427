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

//! Represents a currency: an on-chain token or the US dollar, with its USD price data.

use std::{
    collections::BTreeMap,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    sync::{Arc, LazyLock},
};

use prism_core::{
    correctness::{FAILED, check_nonempty_string, check_valid_string},
    datetime::floor_to_hour,
};
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use super::{
    fixed::{USD_PRECISION, check_fixed_precision},
    price::UsdPrice,
};
use crate::enums::{CurrencyKind, MissingPriceFallback};

/// The symbol (and identifier) of the US dollar currency.
pub const USD_SYMBOL: &str = "USD";

/// Hourly USD prices keyed by hour-aligned UNIX seconds.
pub type HourlyPrices = Arc<BTreeMap<i64, UsdPrice>>;

/// A [`Currency`] shared between amounts and the registry.
pub type SharedCurrency = Arc<Currency>;

static USD: LazyLock<SharedCurrency> = LazyLock::new(|| {
    Arc::new(Currency {
        id: Ustr::from(USD_SYMBOL),
        symbol: Ustr::from(USD_SYMBOL),
        name: Ustr::from("US Dollar"),
        precision: USD_PRECISION,
        kind: CurrencyKind::Usd,
        spot_price: None,
        hourly_prices: None,
    })
});

/// Represents a currency with a fixed decimal precision and optional USD price data.
///
/// Identity is by `id`: the token contract address, or `USD` for the dollar.
#[derive(Clone, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// The currency identifier (token contract address, or `USD`).
    pub id: Ustr,
    /// The ticker symbol (e.g. "WETH").
    pub symbol: Ustr,
    /// The full name of the currency.
    pub name: Ustr,
    /// The number of decimals of the smallest unit.
    pub precision: u8,
    /// The currency kind.
    pub kind: CurrencyKind,
    /// The current USD price of one unit, if known.
    pub spot_price: Option<UsdPrice>,
    /// The historical hourly USD prices, if known.
    pub hourly_prices: Option<HourlyPrices>,
}

impl Currency {
    /// Creates a new token [`Currency`] instance with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `id` is not a valid string.
    /// - `symbol` is the empty string.
    /// - `symbol` is the reserved USD symbol.
    /// - `precision` is outside the representable range [0, FIXED_MAX_PRECISION].
    pub fn new_checked<T: AsRef<str>>(
        id: T,
        symbol: T,
        name: T,
        precision: u8,
    ) -> anyhow::Result<Self> {
        let id = id.as_ref();
        let symbol = symbol.as_ref();
        check_valid_string(id, "id")?;
        check_nonempty_string(symbol, "symbol")?;
        if symbol == USD_SYMBOL {
            anyhow::bail!("invalid token symbol '{symbol}', reserved for the USD currency");
        }
        check_fixed_precision(precision)?;

        Ok(Self {
            id: Ustr::from(id),
            symbol: Ustr::from(symbol),
            name: Ustr::from(name.as_ref()),
            precision,
            kind: CurrencyKind::Token,
            spot_price: None,
            hourly_prices: None,
        })
    }

    /// Creates a new token [`Currency`] instance.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails. See [`Currency::new_checked`] for more details.
    pub fn new<T: AsRef<str>>(id: T, symbol: T, name: T, precision: u8) -> Self {
        Self::new_checked(id, symbol, name, precision).expect(FAILED)
    }

    /// Returns the shared US dollar currency.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn USD() -> SharedCurrency {
        USD.clone()
    }

    /// Returns this currency with the given spot price.
    #[must_use]
    pub fn with_spot_price(mut self, price: UsdPrice) -> Self {
        self.spot_price = Some(price);
        self
    }

    /// Returns this currency with the given hourly price series.
    ///
    /// Timestamps are floored to the hour; an empty series clears the history.
    #[must_use]
    pub fn with_hourly_prices<I>(mut self, prices: I) -> Self
    where
        I: IntoIterator<Item = (i64, UsdPrice)>,
    {
        let series: BTreeMap<i64, UsdPrice> = prices
            .into_iter()
            .map(|(ts, price)| (floor_to_hour(ts), price))
            .collect();

        self.hourly_prices = if series.is_empty() {
            None
        } else {
            Some(Arc::new(series))
        };
        self
    }

    /// Returns true if this is the US dollar currency.
    #[must_use]
    pub fn is_usd(&self) -> bool {
        self.kind == CurrencyKind::Usd
    }

    /// Resolves the USD price applicable at `timestamp`, given the current time `now`.
    ///
    /// - The US dollar always resolves to a price of one.
    /// - Without an hourly series the spot price applies.
    /// - A timestamp at or before `now` looks up the price of its hour; a missing hour resolves
    ///   according to `fallback`.
    /// - A missing or future timestamp resolves to the spot price.
    #[must_use]
    pub fn resolve_usd_price(
        &self,
        timestamp: Option<i64>,
        now: i64,
        fallback: MissingPriceFallback,
    ) -> Option<UsdPrice> {
        if self.is_usd() {
            return Some(UsdPrice::one());
        }

        let Some(hourly) = &self.hourly_prices else {
            return self.spot_price;
        };

        match timestamp {
            Some(ts) if ts <= now => match hourly.get(&floor_to_hour(ts)) {
                Some(price) => Some(*price),
                None => match fallback {
                    MissingPriceFallback::Zero => Some(UsdPrice::zero()),
                    MissingPriceFallback::Spot => self.spot_price,
                },
            },
            _ => self.spot_price,
        }
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(id='{}', symbol='{}', precision={}, name='{}', kind={})",
            stringify!(Currency),
            self.id,
            self.symbol,
            self.precision,
            self.name,
            self.kind,
        )
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    const NOW: i64 = 1_700_010_000;
    const HOUR: i64 = 1_700_006_400;

    fn weth() -> Currency {
        Currency::new("0xc02a", "WETH", "Wrapped Ether", 18)
            .with_spot_price(UsdPrice::from_str("2000").unwrap())
            .with_hourly_prices([(HOUR, UsdPrice::from_str("1900").unwrap())])
    }

    #[rstest]
    fn test_debug_and_display() {
        let currency = Currency::new("0xc02a", "WETH", "Wrapped Ether", 18);
        assert_eq!(
            format!("{currency:?}"),
            "Currency(id='0xc02a', symbol='WETH', precision=18, name='Wrapped Ether', kind=TOKEN)"
        );
        assert_eq!(currency.to_string(), "WETH");
    }

    #[rstest]
    #[case("", "WETH", 18)]
    #[case("0x1", "", 18)]
    #[case("0x1", "USD", 18)]
    #[case("0x1", "WETH", 37)]
    fn test_new_checked_invalid(#[case] id: &str, #[case] symbol: &str, #[case] precision: u8) {
        assert!(Currency::new_checked(id, symbol, "Name", precision).is_err());
    }

    #[rstest]
    #[should_panic(expected = "Condition failed")]
    fn test_new_panics_on_invalid() {
        let _ = Currency::new("", "WETH", "Wrapped Ether", 18);
    }

    #[rstest]
    fn test_usd() {
        let usd = Currency::USD();
        assert!(usd.is_usd());
        assert_eq!(usd.symbol.as_str(), USD_SYMBOL);
        assert_eq!(usd.precision, USD_PRECISION);
        assert!(Arc::ptr_eq(&usd, &Currency::USD()));
    }

    #[rstest]
    fn test_equality_by_id() {
        let a = Currency::new("0xabc", "AAA", "A", 18);
        let b = Currency::new("0xabc", "BBB", "B", 6);
        let c = Currency::new("0xdef", "AAA", "A", 18);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[rstest]
    fn test_with_hourly_prices_floors_and_clears() {
        let currency = Currency::new("0x1", "TKN", "Token", 18)
            .with_hourly_prices([(HOUR + 59, UsdPrice::new(1.0))]);
        let series = currency.hourly_prices.clone().unwrap();
        assert!(series.contains_key(&HOUR));

        let cleared = currency.with_hourly_prices(Vec::new());
        assert!(cleared.hourly_prices.is_none());
    }

    #[rstest]
    fn test_resolve_usd_price_for_usd_is_one() {
        let price = Currency::USD()
            .resolve_usd_price(Some(HOUR), NOW, MissingPriceFallback::Zero)
            .unwrap();
        assert_eq!(price, UsdPrice::one());
    }

    #[rstest]
    #[case(Some(HOUR + 120), MissingPriceFallback::Zero, Some("1900"))]
    #[case(Some(HOUR - 1), MissingPriceFallback::Zero, Some("0"))]
    #[case(Some(HOUR - 1), MissingPriceFallback::Spot, Some("2000"))]
    #[case(Some(NOW + 1), MissingPriceFallback::Zero, Some("2000"))]
    #[case(None, MissingPriceFallback::Zero, Some("2000"))]
    fn test_resolve_usd_price_with_series(
        #[case] timestamp: Option<i64>,
        #[case] fallback: MissingPriceFallback,
        #[case] expected: Option<&str>,
    ) {
        let price = weth().resolve_usd_price(timestamp, NOW, fallback);
        assert_eq!(price, expected.map(|p| UsdPrice::from_str(p).unwrap()));
    }

    #[rstest]
    fn test_resolve_usd_price_without_series_ignores_timestamp() {
        let currency = Currency::new("0x1", "TKN", "Token", 6).with_spot_price(UsdPrice::new(3.0));
        for ts in [None, Some(0), Some(HOUR), Some(NOW + 10_000)] {
            assert_eq!(
                currency.resolve_usd_price(ts, NOW, MissingPriceFallback::Zero),
                Some(UsdPrice::new(3.0))
            );
        }
    }

    #[rstest]
    fn test_resolve_usd_price_without_any_price() {
        let currency = Currency::new("0x1", "TKN", "Token", 6);
        assert!(
            currency
                .resolve_usd_price(None, NOW, MissingPriceFallback::Spot)
                .is_none()
        );
    }
}
