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

//! Table rows produced by mapping fetched entities.

use std::fmt::Display;

use indexmap::IndexMap;
use prism_core::{datetime::unix_secs_to_iso8601, parsing::normalize_decimal_str};
use prism_model::types::{Amount, DisplayOptions, SharedCurrency};
use serde::Serialize;
use serde_json::Value;
use ustr::Ustr;

/// A single table cell value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Free text, ids and decimals without a currency.
    Text(String),
    /// An integer.
    Integer(i64),
    /// An amount denominated in a currency.
    Amount(Amount),
    /// A UNIX timestamp in seconds.
    Timestamp(i64),
    /// A boolean flag.
    Boolean(bool),
    /// A missing or unconvertible value.
    Empty,
}

impl Cell {
    /// Returns true if the cell holds no value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the cell rendered for display, with amounts formatted using `options`.
    #[must_use]
    pub fn to_display_string(&self, options: DisplayOptions) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Amount(amount) => amount.to_display_string(options),
            Self::Timestamp(secs) => unix_secs_to_iso8601(*secs).unwrap_or_else(|| secs.to_string()),
            Self::Boolean(flag) => flag.to_string(),
            Self::Empty => String::new(),
        }
    }
}

impl From<Option<Amount>> for Cell {
    fn from(value: Option<Amount>) -> Self {
        value.map_or(Self::Empty, Self::Amount)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string(DisplayOptions::default()))
    }
}

/// A mapped entity keyed by column field, in column order.
pub type Row = IndexMap<Ustr, Cell>;

/// Returns the string value of `field` in `entity`.
///
/// # Errors
///
/// Returns an error if the field is missing or not a string.
pub fn entity_str<'a>(entity: &'a Value, field: &str) -> anyhow::Result<&'a str> {
    entity
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing string field '{field}'"))
}

/// Returns the integer value of `field`, which may be a JSON number or a numeric string.
///
/// # Errors
///
/// Returns an error if the field is missing or not an integer.
pub fn entity_i64(entity: &Value, field: &str) -> anyhow::Result<i64> {
    match entity.get(field) {
        Some(Value::Number(number)) => number
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("field '{field}' is not an i64: {number}")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("field '{field}' is not an i64 '{s}': {e}")),
        Some(other) => anyhow::bail!("field '{field}' is not an integer: {other}"),
        None => anyhow::bail!("missing integer field '{field}'"),
    }
}

/// Returns a text cell for `field`, normalizing decimal strings.
///
/// # Errors
///
/// Returns an error if the field is missing or not a decimal string.
pub fn decimal_cell(entity: &Value, field: &str) -> anyhow::Result<Cell> {
    let value = entity_str(entity, field)?;
    Ok(Cell::Text(normalize_decimal_str(value)?))
}

/// Returns an amount cell for the decimal string `field` denominated in `currency`.
///
/// A missing or null field maps to [`Cell::Empty`].
///
/// # Errors
///
/// Returns an error if the field is present but not a valid decimal string.
pub fn amount_cell(entity: &Value, field: &str, currency: &SharedCurrency) -> anyhow::Result<Cell> {
    match entity.get(field) {
        None | Some(Value::Null) => Ok(Cell::Empty),
        Some(Value::String(value)) => Ok(Cell::Amount(Amount::from_decimal_str(
            value,
            currency.clone(),
        )?)),
        Some(other) => anyhow::bail!("field '{field}' is not a decimal string: {other}"),
    }
}

/// Returns an amount cell for the raw integer string `field` in the smallest unit of `currency`.
///
/// A missing or null field maps to [`Cell::Empty`].
///
/// # Errors
///
/// Returns an error if the field is present but not a base-10 integer string.
pub fn raw_amount_cell(
    entity: &Value,
    field: &str,
    currency: &SharedCurrency,
) -> anyhow::Result<Cell> {
    match entity.get(field) {
        None | Some(Value::Null) => Ok(Cell::Empty),
        Some(Value::String(raw)) => Ok(Cell::Amount(Amount::from_raw_str(raw, currency.clone())?)),
        Some(other) => anyhow::bail!("field '{field}' is not an integer string: {other}"),
    }
}
