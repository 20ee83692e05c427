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

//! Functions for handling fixed-point arithmetic on 256-bit raw values.
//!
//! A raw value `r` at precision `p` represents the decimal `r / 10^p`. Token amounts use the
//! token's own decimals while USD values and prices use [`USD_PRECISION`].

use alloy_primitives::{I256, U256};
use prism_core::parsing::parse_decimal_parts;

/// The internal fixed-point precision for USD values and USD prices.
pub const USD_PRECISION: u8 = 18;

/// The number of decimals USD values are displayed with by default.
pub const USD_DISPLAY_PRECISION: u8 = 2;

/// The maximum fixed-point precision of a currency.
pub const FIXED_MAX_PRECISION: u8 = 36;

/// The largest exponent for which `10^exp` fits a positive [`I256`].
const MAX_POW10_EXP: u8 = 76;

/// Checks if a given `precision` value is within the allowed fixed-point precision range.
///
/// # Errors
///
/// This function returns an error:
/// - If `precision` exceeds [`FIXED_MAX_PRECISION`].
pub fn check_fixed_precision(precision: u8) -> anyhow::Result<()> {
    if precision > FIXED_MAX_PRECISION {
        anyhow::bail!(
            "`precision` exceeded maximum `FIXED_MAX_PRECISION` ({FIXED_MAX_PRECISION}), was {precision}"
        )
    }
    Ok(())
}

/// Returns `10^exp` as an unsigned 256-bit integer, or `None` past `10^76`.
#[must_use]
pub fn pow10_u256(exp: u8) -> Option<U256> {
    if exp > MAX_POW10_EXP {
        return None;
    }
    Some(U256::from(10u64).pow(U256::from(exp)))
}

/// Returns `10^exp` as a signed 256-bit integer, or `None` past `10^76`.
#[must_use]
pub fn pow10_i256(exp: u8) -> Option<I256> {
    pow10_u256(exp).map(I256::from_raw)
}

/// Parses a display-unit decimal string into a raw value at `precision`.
///
/// Fractional digits beyond `precision` are truncated toward zero.
///
/// # Errors
///
/// Returns an error if the string is not a valid decimal or the scaled value overflows 256 bits.
pub fn parse_fixed_i256(s: &str, precision: u8) -> anyhow::Result<I256> {
    let parts = parse_decimal_parts(s)?;
    let digits = parts.to_scaled_digits(precision);
    let magnitude = I256::from_dec_str(&digits)
        .map_err(|e| anyhow::anyhow!("value '{s}' out of range at precision {precision}: {e}"))?;

    if parts.negative {
        magnitude
            .checked_neg()
            .ok_or_else(|| anyhow::anyhow!("value '{s}' out of range at precision {precision}"))
    } else {
        Ok(magnitude)
    }
}

/// Parses a pre-scaled raw integer string, e.g. an on-chain `uint256` value.
///
/// # Errors
///
/// Returns an error if the string is not a base-10 integer within the `I256` range.
pub fn parse_raw_i256(s: &str) -> anyhow::Result<I256> {
    let s = s.trim();
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        anyhow::bail!("invalid raw integer '{s}', expected base-10 digits");
    }
    let signed = if s.starts_with('+') { digits } else { s };
    I256::from_dec_str(signed).map_err(|e| anyhow::anyhow!("invalid raw integer '{s}': {e}"))
}

/// Converts an `f64` value in display units to a raw value at `precision`.
///
/// The shortest decimal representation of `value` is used, so `0.1` converts exactly.
///
/// # Errors
///
/// Returns an error if `value` is not finite or the scaled value overflows 256 bits.
pub fn f64_to_fixed_i256(value: f64, precision: u8) -> anyhow::Result<I256> {
    if !value.is_finite() {
        anyhow::bail!("invalid `f64` value, was {value}");
    }
    parse_fixed_i256(&format!("{value:e}"), precision)
}

/// Converts a raw value at `precision` to an `f64`.
///
/// The result is approximate: `f64` carries roughly 15-17 significant digits.
#[must_use]
pub fn fixed_i256_to_f64(raw: I256, precision: u8) -> f64 {
    format_fixed_i256(raw, precision)
        .parse::<f64>()
        .unwrap_or(f64::NAN)
}

/// Formats a raw value at `precision` as a normalized exact decimal string.
///
/// Trailing fractional zeros are removed and zero formats as `"0"`.
#[must_use]
pub fn format_fixed_i256(raw: I256, precision: u8) -> String {
    let digits = raw.unsigned_abs().to_string();
    let precision = usize::from(precision);

    let (integer, fraction) = if digits.len() > precision {
        let (i, f) = digits.split_at(digits.len() - precision);
        (i.to_string(), f.to_string())
    } else {
        let mut f = "0".repeat(precision - digits.len());
        f.push_str(&digits);
        ("0".to_string(), f)
    };

    let fraction = fraction.trim_end_matches('0');
    let sign = if raw.is_negative() { "-" } else { "" };

    if fraction.is_empty() {
        format!("{sign}{integer}")
    } else {
        format!("{sign}{integer}.{fraction}")
    }
}

/// Rescales an unsigned magnitude from `from_precision` to `to_precision` decimals.
///
/// When reducing precision the result is rounded half away from zero.
/// Returns `None` on overflow.
#[must_use]
pub fn rescale_round_half_away(
    magnitude: U256,
    from_precision: u8,
    to_precision: u8,
) -> Option<U256> {
    if to_precision >= from_precision {
        let factor = pow10_u256(to_precision - from_precision)?;
        return magnitude.checked_mul(factor);
    }

    let divisor = pow10_u256(from_precision - to_precision)?;
    let quotient = magnitude / divisor;
    let remainder = magnitude % divisor;

    if remainder.checked_mul(U256::from(2u64))? >= divisor {
        quotient.checked_add(U256::from(1u64))
    } else {
        Some(quotient)
    }
}

/// Multiplies `raw` by `numerator` then divides by `denominator`, truncating toward zero.
///
/// Returns `None` on overflow or a zero `denominator`.
#[must_use]
pub fn mul_div_i256(raw: I256, numerator: I256, denominator: I256) -> Option<I256> {
    if denominator.is_zero() {
        return None;
    }
    raw.checked_mul(numerator)?.checked_div(denominator)
}
