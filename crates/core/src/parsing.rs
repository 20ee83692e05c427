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

//! Core parsing functions for decimal strings as returned by subgraph APIs and entered by users.

/// The maximum absolute exponent accepted in scientific notation.
pub const MAX_DECIMAL_EXPONENT: i64 = 1_000;

/// A decimal string decomposed into its sign and unpadded digit runs.
///
/// The integer part carries no leading zeros and the fraction no trailing zeros, so zero is
/// represented by two empty runs and a positive sign.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecimalParts {
    /// Whether the value is strictly negative.
    pub negative: bool,
    /// Digits before the decimal point.
    pub integer: String,
    /// Digits after the decimal point.
    pub fraction: String,
}

impl DecimalParts {
    /// Returns true if the parts represent zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.integer.is_empty() && self.fraction.is_empty()
    }

    /// Returns the unsigned digit string of the value scaled by `10^precision`.
    ///
    /// Fractional digits beyond `precision` are truncated toward zero.
    #[must_use]
    pub fn to_scaled_digits(&self, precision: u8) -> String {
        let precision = usize::from(precision);
        let mut digits = String::with_capacity(self.integer.len() + precision);
        digits.push_str(&self.integer);

        if self.fraction.len() >= precision {
            digits.push_str(&self.fraction[..precision]);
        } else {
            digits.push_str(&self.fraction);
            digits.extend(std::iter::repeat_n('0', precision - self.fraction.len()));
        }

        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Returns the normalized decimal string, e.g. `-1.5`, `0.001` or `0`.
    #[must_use]
    pub fn to_normalized_string(&self) -> String {
        let mut s = String::with_capacity(self.integer.len() + self.fraction.len() + 3);
        if self.negative {
            s.push('-');
        }
        if self.integer.is_empty() {
            s.push('0');
        } else {
            s.push_str(&self.integer);
        }
        if !self.fraction.is_empty() {
            s.push('.');
            s.push_str(&self.fraction);
        }
        s
    }
}

/// Parses a decimal string with an optional sign and optional exponent into [`DecimalParts`].
///
/// Accepts forms such as `"1.5"`, `"-0.25"`, `"+3"`, `".5"`, `"5."` and `"1.5e-3"`.
///
/// # Errors
///
/// Returns an error if:
/// - The string is empty or contains no digits.
/// - The string contains characters other than digits, a single `.`, a sign and an exponent.
/// - The exponent magnitude exceeds [`MAX_DECIMAL_EXPONENT`].
pub fn parse_decimal_parts(s: &str) -> anyhow::Result<DecimalParts> {
    let input = s.trim();
    if input.is_empty() {
        anyhow::bail!("invalid decimal string, was empty");
    }

    let (negative, unsigned) = match input.as_bytes()[0] {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(pos) => {
            let exp_str = &unsigned[pos + 1..];
            let exp = exp_str
                .parse::<i64>()
                .map_err(|_| anyhow::anyhow!("invalid exponent in decimal string '{input}'"))?;
            if exp.abs() > MAX_DECIMAL_EXPONENT {
                anyhow::bail!(
                    "exponent {exp} out of range [-{MAX_DECIMAL_EXPONENT}, {MAX_DECIMAL_EXPONENT}] for '{input}'"
                );
            }
            (&unsigned[..pos], exp)
        }
        None => (unsigned, 0),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        anyhow::bail!("invalid decimal string '{input}', contained no digits");
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        anyhow::bail!("invalid decimal string '{input}'");
    }

    let digits = format!("{int_part}{frac_part}");
    let len = digits.len() as i64;
    let point = int_part.len() as i64 + exponent;

    let (integer, fraction) = if point <= 0 {
        let mut fraction = "0".repeat(point.unsigned_abs() as usize);
        fraction.push_str(&digits);
        (String::new(), fraction)
    } else if point >= len {
        let mut integer = digits;
        integer.push_str(&"0".repeat((point - len) as usize));
        (integer, String::new())
    } else {
        let (i, f) = digits.split_at(point as usize);
        (i.to_string(), f.to_string())
    };

    let integer = integer.trim_start_matches('0').to_string();
    let fraction = fraction.trim_end_matches('0').to_string();
    let negative = negative && !(integer.is_empty() && fraction.is_empty());

    Ok(DecimalParts {
        negative,
        integer,
        fraction,
    })
}

/// Returns the normalized form of a decimal string (see [`DecimalParts::to_normalized_string`]).
///
/// # Errors
///
/// Returns an error if `s` is not a valid decimal string.
pub fn normalize_decimal_str(s: &str) -> anyhow::Result<String> {
    parse_decimal_parts(s).map(|parts| parts.to_normalized_string())
}

/// Parses a `u8` from a string which may carry surrounding whitespace, e.g. a token's `decimals`.
///
/// # Errors
///
/// Returns an error if the string is not an integer in `0..=255`.
pub fn parse_u8_str(s: &str) -> anyhow::Result<u8> {
    let s = s.trim();
    s.parse::<u8>()
        .map_err(|e| anyhow::anyhow!("invalid u8 string '{s}': {e}"))
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0", "0")]
    #[case("-0", "0")]
    #[case("000.000", "0")]
    #[case("1", "1")]
    #[case("+1.50", "1.5")]
    #[case("-1.50", "-1.5")]
    #[case(".5", "0.5")]
    #[case("5.", "5")]
    #[case("007.0700", "7.07")]
    #[case("1.5e-3", "0.0015")]
    #[case("1.5E3", "1500")]
    #[case("-2.5e+2", "-250")]
    #[case("12345e-2", "123.45")]
    #[case("1e0", "1")]
    #[case("  42  ", "42")]
    fn test_normalize_decimal_str(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_decimal_str(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case(".")]
    #[case("1.2.3")]
    #[case("1,000")]
    #[case("abc")]
    #[case("1e")]
    #[case("1e-abc")]
    #[case("1e1001")]
    #[case("--1")]
    #[case("NaN")]
    fn test_parse_decimal_parts_invalid(#[case] input: &str) {
        assert!(parse_decimal_parts(input).is_err());
    }

    #[rstest]
    fn test_parse_decimal_parts_fields() {
        let parts = parse_decimal_parts("-0012.3400").unwrap();
        assert!(parts.negative);
        assert_eq!(parts.integer, "12");
        assert_eq!(parts.fraction, "34");
        assert!(!parts.is_zero());
    }

    #[rstest]
    #[case("1.5", 2, "150")]
    #[case("1.5", 0, "1")]
    #[case("0.009", 2, "0")]
    #[case("0.019", 2, "1")]
    #[case("123", 3, "123000")]
    #[case("0", 18, "0")]
    #[case("-1.999", 2, "199")]
    #[case("1e-18", 18, "1")]
    fn test_to_scaled_digits(#[case] input: &str, #[case] precision: u8, #[case] expected: &str) {
        let parts = parse_decimal_parts(input).unwrap();
        assert_eq!(parts.to_scaled_digits(precision), expected);
    }

    #[rstest]
    #[case("18", 18)]
    #[case(" 6 ", 6)]
    #[case("0", 0)]
    fn test_parse_u8_str(#[case] input: &str, #[case] expected: u8) {
        assert_eq!(parse_u8_str(input).unwrap(), expected);
    }

    #[rstest]
    #[case("256")]
    #[case("-1")]
    #[case("")]
    #[case("1.5")]
    fn test_parse_u8_str_invalid(#[case] input: &str) {
        assert!(parse_u8_str(input).is_err());
    }
}
