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

//! Filter value parsers turning raw user input into GraphQL literals.
//!
//! A parser is a plain function attached to a column descriptor. It validates the raw value for
//! the column's data type and returns the literal as it must appear in a `where` clause.

use prism_core::{datetime::parse_unix_secs, parsing::parse_decimal_parts};

use crate::enums::ColumnDataType;

/// A function converting a raw filter value into a GraphQL literal.
pub type FilterValueParser = fn(&str) -> anyhow::Result<String>;

/// Renders `value` as a quoted GraphQL string literal.
///
/// # Errors
///
/// This function never fails; the signature matches [`FilterValueParser`].
pub fn parse_string_literal(value: &str) -> anyhow::Result<String> {
    Ok(quote(value))
}

/// Renders an entity id as a quoted lowercase literal.
///
/// # Errors
///
/// Returns an error if `value` is empty or contains whitespace.
pub fn parse_id_literal(value: &str) -> anyhow::Result<String> {
    let value = value.trim();
    if value.is_empty() {
        anyhow::bail!("id was empty");
    }
    if value.chars().any(char::is_whitespace) {
        anyhow::bail!("id contains whitespace");
    }
    Ok(quote(&value.to_ascii_lowercase()))
}

/// Renders a 32-bit integer as an unquoted literal.
///
/// # Errors
///
/// Returns an error if `value` is not a valid `i32`.
pub fn parse_int_literal(value: &str) -> anyhow::Result<String> {
    let value = value.trim();
    let parsed: i32 = value
        .parse()
        .map_err(|e| anyhow::anyhow!("not an integer: {e}"))?;
    Ok(parsed.to_string())
}

/// Renders an arbitrary precision integer as a quoted literal.
///
/// # Errors
///
/// Returns an error if `value` is not an integral decimal number.
pub fn parse_bigint_literal(value: &str) -> anyhow::Result<String> {
    let parts = parse_decimal_parts(value)?;
    if !parts.fraction.is_empty() {
        anyhow::bail!("not an integer");
    }
    Ok(quote(&parts.to_normalized_string()))
}

/// Renders an arbitrary precision decimal as a quoted normalized literal.
///
/// # Errors
///
/// Returns an error if `value` is not a decimal number.
pub fn parse_bigdecimal_literal(value: &str) -> anyhow::Result<String> {
    let parts = parse_decimal_parts(value)?;
    Ok(quote(&parts.to_normalized_string()))
}

/// Renders a timestamp (UNIX seconds, RFC 3339 or `YYYY-MM-DD`) as a quoted seconds literal.
///
/// # Errors
///
/// Returns an error if `value` is not a recognized timestamp.
pub fn parse_timestamp_literal(value: &str) -> anyhow::Result<String> {
    let secs = parse_unix_secs(value)?;
    Ok(quote(&secs.to_string()))
}

/// Renders a boolean as an unquoted literal.
///
/// # Errors
///
/// Returns an error if `value` is not one of `true`, `false`, `yes`, `no`, `1` or `0`.
pub fn parse_boolean_literal(value: &str) -> anyhow::Result<String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok("true".to_string()),
        "false" | "no" | "0" => Ok("false".to_string()),
        other => anyhow::bail!("not a boolean: '{other}'"),
    }
}

/// Returns the default parser for columns of `data_type`.
#[must_use]
pub const fn default_parser(data_type: ColumnDataType) -> FilterValueParser {
    match data_type {
        ColumnDataType::Text => parse_string_literal,
        ColumnDataType::Id => parse_id_literal,
        ColumnDataType::Integer => parse_int_literal,
        ColumnDataType::BigInt | ColumnDataType::RawTokenAmount => parse_bigint_literal,
        ColumnDataType::BigDecimal | ColumnDataType::Amount | ColumnDataType::TokenAmount => {
            parse_bigdecimal_literal
        }
        ColumnDataType::Timestamp => parse_timestamp_literal,
        ColumnDataType::Boolean => parse_boolean_literal,
    }
}

/// Parses a comma separated list with `parser` and renders it as a GraphQL list literal.
///
/// Blank items are skipped.
///
/// # Errors
///
/// Returns an error if the list has no items or any item fails to parse.
pub fn parse_list_literal(value: &str, parser: FilterValueParser) -> anyhow::Result<String> {
    let items = value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parser)
        .collect::<anyhow::Result<Vec<String>>>()?;

    if items.is_empty() {
        anyhow::bail!("list was empty");
    }
    Ok(format!("[{}]", items.join(", ")))
}

fn quote(value: &str) -> String {
    // JSON string escapes are valid GraphQL string escapes
    serde_json::Value::String(value.to_string()).to_string()
}
