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

//! Property-based tests for fixed-point amounts.
//!
//! These tests verify invariants that should hold for any raw value and precision:
//! - Exact strings round-trip through the string constructor
//! - Display strings stay within rounding distance of the `f64` approximation
//! - Nonzero amounts never display as zero
//! - Currencies without an hourly series ignore conversion timestamps
//! - Converting to a currency with the same symbol is the identity

use std::sync::Arc;

use prism_model::types::{Amount, Currency, DisplayOptions, SharedCurrency, UsdPrice};
use proptest::prelude::*;
use rstest::rstest;

fn token(precision: u8) -> SharedCurrency {
    Arc::new(Currency::new("0xtoken", "TKN", "Token", precision))
}

/// Parses a rendered display string back to an `f64`, stripping sign, `$`, grouping and symbol.
fn parse_display(s: &str) -> f64 {
    let negative = s.starts_with('-');
    let digits: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = digits.parse().expect("Display string should contain a number");
    if negative { -value } else { value }
}

proptest! {
    /// Property: the exact string reproduces the same raw value.
    #[rstest]
    fn exact_string_round_trips(raw in any::<i64>(), precision in 0u8..=24) {
        let currency = token(precision);
        let amount = Amount::from_raw_i128(i128::from(raw), currency.clone());
        let parsed = Amount::from_decimal_str(&amount.to_exact_string(), currency)
            .expect("Exact string should parse");
        prop_assert_eq!(parsed.raw(), amount.raw());
    }

    /// Property: the default display string is within half a cent of the `f64` value.
    #[rstest]
    fn usd_display_within_rounding(raw in -1_000_000_000_000_000_000_000_000i128..=1_000_000_000_000_000_000_000_000i128) {
        let amount = Amount::from_raw_i128(raw, Currency::USD());
        let displayed = parse_display(&amount.to_display_string(DisplayOptions::default()));
        let expected = amount.as_f64();
        let tolerance = 0.005 + expected.abs() * 1e-12;
        prop_assert!(
            (displayed - expected).abs() <= tolerance,
            "Display {} too far from {}",
            displayed,
            expected
        );
    }

    /// Property: nonzero amounts always render a nonzero digit.
    #[rstest]
    fn nonzero_never_displays_zero(
        raw in any::<i64>().prop_filter("nonzero", |r| *r != 0),
        precision in 0u8..=18,
        abbreviate in any::<bool>(),
    ) {
        let amount = Amount::from_raw_i128(i128::from(raw), token(precision));
        let options = DisplayOptions { abbreviate, decimals: None };
        let displayed = amount.to_display_string(options);
        prop_assert!(
            displayed.chars().any(|c| c.is_ascii_digit() && c != '0'),
            "Nonzero amount {:?} displayed as {}",
            amount,
            displayed
        );
    }

    /// Property: without an hourly series every timestamp converts at the spot price.
    #[rstest]
    fn no_series_ignores_timestamp(
        raw in 0i64..=i64::MAX,
        timestamp in proptest::option::of(0i64..=4_000_000_000),
        now in 0i64..=4_000_000_000,
    ) {
        let currency = Arc::new(
            Currency::new("0xspot", "SPOT", "Spot Only", 18).with_spot_price(UsdPrice::new(3.5)),
        );
        let amount = Amount::from_raw_i128(i128::from(raw), currency);
        prop_assert_eq!(amount.to_usd_at(timestamp, now), amount.to_usd_at(None, now));
    }

    /// Property: converting into a currency with the same symbol returns the input unchanged.
    #[rstest]
    fn from_token_same_symbol_is_identity(
        raw in any::<i64>(),
        timestamp in proptest::option::of(0i64..=4_000_000_000),
    ) {
        let amount = Amount::from_raw_i128(i128::from(raw), token(18));
        let target = Arc::new(Currency::new("0xelsewhere", "TKN", "Token Elsewhere", 6));
        let converted = Amount::from_token_at(&amount, &target, timestamp, 4_000_000_000);
        prop_assert_eq!(converted, Some(amount));
    }
}
