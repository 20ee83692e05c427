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

//! Represents an exact amount of a currency, with display formatting and USD conversion.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    ops::Neg,
    str::FromStr,
};

use alloy_primitives::{I256, U256};
use prism_core::{correctness::FAILED, datetime::unix_timestamp_secs};
use rust_decimal::Decimal;
use serde::Serialize;
use thousands::Separable;

use super::{
    currency::{Currency, SharedCurrency},
    fixed::{
        USD_DISPLAY_PRECISION, f64_to_fixed_i256, fixed_i256_to_f64, format_fixed_i256,
        mul_div_i256, parse_fixed_i256, parse_raw_i256, pow10_i256, rescale_round_half_away,
    },
};
use crate::enums::MissingPriceFallback;

/// Magnitude suffixes for abbreviated display, largest first, as (power of ten, suffix).
const ABBREVIATIONS: [(u8, &str); 4] = [(12, "T"), (9, "B"), (6, "M"), (3, "k")];

/// Options for [`Amount::to_display_string`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Abbreviate magnitudes of one thousand or more with `k`, `M`, `B` or `T`.
    pub abbreviate: bool,
    /// The number of decimals to render (default 2, or 0 for abbreviated values below 1000).
    pub decimals: Option<u8>,
}

impl DisplayOptions {
    /// Returns options which abbreviate large magnitudes.
    #[must_use]
    pub const fn abbreviated() -> Self {
        Self {
            abbreviate: true,
            decimals: None,
        }
    }
}

/// Represents an exact amount of a currency.
///
/// The raw value is the amount in the currency's smallest unit, i.e. scaled by
/// `10^currency.precision`. Amounts are immutable and never mix currencies in arithmetic.
#[derive(Clone)]
pub struct Amount {
    raw: I256,
    currency: SharedCurrency,
}

impl Amount {
    /// Creates a new [`Amount`] from a display-unit `f64` with correctness checking.
    ///
    /// Digits beyond the currency precision are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not finite or overflows the raw range.
    pub fn new_checked(value: f64, currency: SharedCurrency) -> anyhow::Result<Self> {
        let raw = f64_to_fixed_i256(value, currency.precision)?;
        Ok(Self { raw, currency })
    }

    /// Creates a new [`Amount`] from a display-unit `f64`.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails. See [`Amount::new_checked`] for more details.
    #[must_use]
    pub fn new(value: f64, currency: SharedCurrency) -> Self {
        Self::new_checked(value, currency).expect(FAILED)
    }

    /// Creates a new [`Amount`] from a display-unit decimal string such as `"1.5"` or `"2e-3"`.
    ///
    /// Digits beyond the currency precision are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a valid decimal or overflows the raw range.
    pub fn from_decimal_str(value: &str, currency: SharedCurrency) -> anyhow::Result<Self> {
        let raw = parse_fixed_i256(value, currency.precision)?;
        Ok(Self { raw, currency })
    }

    /// Creates a new [`Amount`] from a raw value already scaled to the currency precision.
    #[must_use]
    pub fn from_raw(raw: I256, currency: SharedCurrency) -> Self {
        Self { raw, currency }
    }

    /// Creates a new [`Amount`] from a raw integer string, e.g. an on-chain `uint256` balance.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a base-10 integer in the `I256` range.
    pub fn from_raw_str(raw: &str, currency: SharedCurrency) -> anyhow::Result<Self> {
        Ok(Self {
            raw: parse_raw_i256(raw)?,
            currency,
        })
    }

    /// Creates a new [`Amount`] from a raw `i128` value.
    #[must_use]
    pub fn from_raw_i128(raw: i128, currency: SharedCurrency) -> Self {
        let magnitude = I256::from_raw(U256::from(raw.unsigned_abs()));
        let raw = if raw < 0 { -magnitude } else { magnitude };
        Self { raw, currency }
    }

    /// Returns a zero amount of `currency`.
    #[must_use]
    pub fn zero(currency: SharedCurrency) -> Self {
        Self {
            raw: I256::ZERO,
            currency,
        }
    }

    /// Returns the raw fixed-point value.
    #[must_use]
    pub const fn raw(&self) -> I256 {
        self.raw
    }

    /// Returns the currency of this amount.
    #[must_use]
    pub const fn currency(&self) -> &SharedCurrency {
        &self.currency
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Returns true if the amount is strictly negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.raw.is_negative()
    }

    /// Returns an `f64` approximation of the amount in display units.
    ///
    /// This conversion is lossy for values with more than about 15 significant digits.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        fixed_i256_to_f64(self.raw, self.currency.precision)
    }

    /// Returns the amount as a `Decimal`, or `None` if it is not representable.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        Decimal::from_str_exact(&self.to_exact_string()).ok()
    }

    /// Returns the exact normalized decimal string in display units, e.g. `"-1.5"` or `"0"`.
    #[must_use]
    pub fn to_exact_string(&self) -> String {
        format_fixed_i256(self.raw, self.currency.precision)
    }

    /// Returns the human readable representation of the amount.
    ///
    /// USD amounts are prefixed with `$` (e.g. `-$1,234.50`), token amounts are suffixed with the
    /// symbol (e.g. `1.50 WETH`). Rounding is half away from zero. A nonzero amount never
    /// renders as zero: the number of decimals doubles until a significant digit shows, up to the
    /// currency precision.
    #[must_use]
    pub fn to_display_string(&self, options: DisplayOptions) -> String {
        let precision = self.currency.precision;
        let magnitude = self.raw.unsigned_abs();

        let thousands = magnitude >= pow10(precision + 3)
            || rounds_to_thousand(magnitude, precision, options.decimals.unwrap_or(0));
        let (number, nonzero) = if options.abbreviate && thousands {
            abbreviate_magnitude(magnitude, precision, options.decimals.unwrap_or(2))
        } else {
            let default = if options.abbreviate {
                0
            } else {
                USD_DISPLAY_PRECISION
            };
            render_magnitude(magnitude, precision, options.decimals.unwrap_or(default))
        };

        let sign = if self.raw.is_negative() && nonzero {
            "-"
        } else {
            ""
        };

        if self.currency.is_usd() {
            format!("{sign}${number}")
        } else {
            format!("{sign}{number} {}", self.currency.symbol)
        }
    }

    /// Converts this amount to USD at the hour of `timestamp`, using the system clock.
    ///
    /// See [`Amount::to_usd_at`].
    #[must_use]
    pub fn to_usd(&self, timestamp: Option<i64>) -> Option<Self> {
        self.to_usd_at(timestamp, unix_timestamp_secs())
    }

    /// Converts this amount to USD at the hour of `timestamp`, given the current time `now`.
    ///
    /// USD amounts return themselves. A historical timestamp whose hour has no recorded price
    /// converts to zero USD. Returns `None` if no price applies or the conversion overflows.
    #[must_use]
    pub fn to_usd_at(&self, timestamp: Option<i64>, now: i64) -> Option<Self> {
        if self.currency.is_usd() {
            return Some(self.clone());
        }

        let fallback = MissingPriceFallback::Zero;
        let price = self.currency.resolve_usd_price(timestamp, now, fallback)?;
        let scale = pow10_i256(self.currency.precision)?;

        match mul_div_i256(self.raw, price.raw, scale) {
            Some(raw) => Some(Self::from_raw(raw, Currency::USD())),
            None => {
                log::warn!("Overflow converting {self} to USD at price {price}");
                None
            }
        }
    }

    /// Converts a USD amount into `target` at the hour of `timestamp`, using the system clock.
    ///
    /// See [`Amount::from_usd_at`].
    #[must_use]
    pub fn from_usd(usd: &Self, target: &SharedCurrency, timestamp: Option<i64>) -> Option<Self> {
        Self::from_usd_at(usd, target, timestamp, unix_timestamp_secs())
    }

    /// Converts a USD amount into `target` at the hour of `timestamp`, given the current time `now`.
    ///
    /// A historical timestamp whose hour has no recorded price falls back to the spot price.
    /// Returns `None` if `usd` is not a USD amount, no nonzero price applies, or the conversion
    /// overflows.
    #[must_use]
    pub fn from_usd_at(
        usd: &Self,
        target: &SharedCurrency,
        timestamp: Option<i64>,
        now: i64,
    ) -> Option<Self> {
        if !usd.currency.is_usd() {
            log::warn!("Cannot convert {usd} from USD, amount is not denominated in USD");
            return None;
        }

        if target.is_usd() {
            return Some(usd.clone());
        }

        let price = target.resolve_usd_price(timestamp, now, MissingPriceFallback::Spot)?;
        if price.is_zero() {
            return None;
        }
        let scale = pow10_i256(target.precision)?;

        match mul_div_i256(usd.raw, scale, price.raw) {
            Some(raw) => Some(Self::from_raw(raw, target.clone())),
            None => {
                log::warn!("Overflow converting {usd} to {target} at price {price}");
                None
            }
        }
    }

    /// Converts `amount` into `target` through USD, using the system clock.
    ///
    /// See [`Amount::from_token_at`].
    #[must_use]
    pub fn from_token(
        amount: &Self,
        target: &SharedCurrency,
        timestamp: Option<i64>,
    ) -> Option<Self> {
        Self::from_token_at(amount, target, timestamp, unix_timestamp_secs())
    }

    /// Converts `amount` into `target` through USD at the hour of `timestamp`, given `now`.
    ///
    /// Amounts whose currency has the target's symbol are returned unchanged.
    /// Returns `None` if either conversion leg fails.
    #[must_use]
    pub fn from_token_at(
        amount: &Self,
        target: &SharedCurrency,
        timestamp: Option<i64>,
        now: i64,
    ) -> Option<Self> {
        if amount.currency.symbol == target.symbol {
            return Some(amount.clone());
        }

        let usd = amount.to_usd_at(timestamp, now)?;
        Self::from_usd_at(&usd, target, timestamp, now)
    }

    /// Adds `other` to this amount, returning `None` on a currency mismatch or overflow.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        let raw = self.raw.checked_add(other.raw)?;
        Some(Self::from_raw(raw, self.currency.clone()))
    }

    /// Negates this amount, returning `None` if the raw value is the minimum `I256`.
    #[must_use]
    pub fn checked_neg(&self) -> Option<Self> {
        let raw = self.raw.checked_neg()?;
        Some(Self::from_raw(raw, self.currency.clone()))
    }

    /// Subtracts `other` from this amount, returning `None` on a currency mismatch or overflow.
    #[must_use]
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        let raw = self.raw.checked_sub(other.raw)?;
        Some(Self::from_raw(raw, self.currency.clone()))
    }
}

/// Returns `10^exp`; callers keep `exp` within `FIXED_MAX_PRECISION + 12`.
fn pow10(exp: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Renders `magnitude` at `precision` with `decimals` decimals and `,` grouping.
///
/// Doubles the decimals while a nonzero magnitude renders as zero. Returns the rendered number
/// and whether it is nonzero.
fn render_magnitude(magnitude: U256, precision: u8, decimals: u8) -> (String, bool) {
    let mut decimals = decimals.min(precision);

    loop {
        let scaled = rescale_round_half_away(magnitude, precision, decimals).unwrap_or(magnitude);
        if scaled.is_zero() && !magnitude.is_zero() && decimals < precision {
            decimals = decimals.saturating_mul(2).max(2).min(precision);
            continue;
        }
        return (format_scaled(scaled, decimals), !scaled.is_zero());
    }
}

/// Returns true if `magnitude` reaches one thousand once rounded to `decimals`.
fn rounds_to_thousand(magnitude: U256, precision: u8, decimals: u8) -> bool {
    let decimals = decimals.min(precision);
    rescale_round_half_away(magnitude, precision, decimals)
        .is_some_and(|scaled| scaled >= pow10(decimals + 3))
}

/// Renders a magnitude of at least one thousand, after rounding, with a `k`, `M`, `B` or `T`
/// suffix.
fn abbreviate_magnitude(magnitude: U256, precision: u8, decimals: u8) -> (String, bool) {
    let decimals = decimals.min(precision + 3);
    let index = ABBREVIATIONS
        .iter()
        .position(|(exp, _)| magnitude >= pow10(precision + exp))
        .unwrap_or(ABBREVIATIONS.len() - 1);

    // Rounding can carry into the next unit, e.g. 999.999k renders as 1.00M
    let mut index = index;
    loop {
        let (exp, suffix) = ABBREVIATIONS[index];
        let scaled =
            rescale_round_half_away(magnitude, precision + exp, decimals).unwrap_or(magnitude);
        if index > 0 && scaled >= pow10(decimals + 3) {
            index -= 1;
            continue;
        }
        return (
            format!("{}{suffix}", format_scaled(scaled, decimals)),
            !scaled.is_zero(),
        );
    }
}

fn format_scaled(scaled: U256, decimals: u8) -> String {
    let divisor = pow10(decimals);
    let integer = (scaled / divisor).separate_with_commas();

    if decimals == 0 {
        return integer;
    }

    let fraction = (scaled % divisor).to_string();
    let width = usize::from(decimals);
    format!("{integer}.{fraction:0>width$}")
}

impl FromStr for Amount {
    type Err = anyhow::Error;

    /// Parses `"<amount> <symbol>"` where the symbol is `USD`.
    ///
    /// Token amounts need a currency descriptor, use [`Amount::from_decimal_str`] instead.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split_whitespace().collect();
        match parts.as_slice() {
            [amount, symbol] if *symbol == Currency::USD().symbol.as_str() => {
                Self::from_decimal_str(amount, Currency::USD())
            }
            [_, symbol] => anyhow::bail!(
                "cannot parse '{value}', currency '{symbol}' requires a registry lookup"
            ),
            _ => anyhow::bail!("invalid input format '{value}'. Expected '<amount> USD'"),
        }
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.currency == other.currency
    }
}

impl Eq for Amount {}

impl Hash for Amount {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
        self.currency.hash(state);
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.raw.cmp(&other.raw))
    }
}

/// Negation saturates: the negation of the minimum raw value is `I256::MAX`.
/// Use [`Amount::checked_neg`] to detect that case.
impl Neg for Amount {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self {
            raw: self.raw.saturating_neg(),
            currency: self.currency,
        }
    }
}

impl Debug for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}, {})",
            stringify!(Amount),
            self.to_exact_string(),
            self.currency.symbol
        )
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.to_exact_string(), self.currency.symbol)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_exact_string())
    }
}
