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

//! Enumerations for query construction.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

/// A comparison operator applied by a `where` clause filter.
///
/// Each operator renders as a suffix appended to the filtered field name.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// The field equals the value.
    #[strum(to_string = "eq", serialize = "equals", serialize = "=")]
    Equals = 1,
    /// The field is strictly less than the value.
    #[strum(to_string = "lt", serialize = "<")]
    LessThan = 2,
    /// The field is less than or equal to the value.
    #[strum(to_string = "lte", serialize = "<=")]
    LessThanOrEqual = 3,
    /// The field is strictly greater than the value.
    #[strum(to_string = "gt", serialize = ">")]
    GreaterThan = 4,
    /// The field is greater than or equal to the value.
    #[strum(to_string = "gte", serialize = ">=")]
    GreaterThanOrEqual = 5,
    /// The text field starts with the value.
    #[strum(to_string = "starts_with", serialize = "prefix")]
    StartsWith = 6,
    /// The text field ends with the value.
    #[strum(to_string = "ends_with", serialize = "suffix")]
    EndsWith = 7,
    /// The text field contains the value.
    #[strum(to_string = "contains")]
    Contains = 8,
    /// The field equals any value of a comma separated list.
    #[strum(to_string = "in", serialize = "any_of")]
    IsAnyOf = 9,
}

impl FilterOperator {
    /// Returns the suffix appended to the field name in a `where` clause.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Equals => "",
            Self::LessThan => "_lt",
            Self::LessThanOrEqual => "_lte",
            Self::GreaterThan => "_gt",
            Self::GreaterThanOrEqual => "_gte",
            Self::StartsWith => "_starts_with",
            Self::EndsWith => "_ends_with",
            Self::Contains => "_contains",
            Self::IsAnyOf => "_in",
        }
    }
}

/// The sort direction of a query.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Ascending order.
    #[default]
    Asc = 1,
    /// Descending order.
    Desc = 2,
}

impl OrderDirection {
    /// Returns the operator which selects entities strictly after a cursor in this direction.
    #[must_use]
    pub const fn cursor_operator(self) -> FilterOperator {
        match self {
            Self::Asc => FilterOperator::GreaterThan,
            Self::Desc => FilterOperator::LessThan,
        }
    }
}

/// The data type of an entity column, which determines filter parsing and the cursor type.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnDataType {
    /// Free text.
    Text = 1,
    /// An entity identifier, such as a contract address.
    Id = 2,
    /// A 32-bit GraphQL `Int`.
    Integer = 3,
    /// An arbitrary precision integer.
    #[strum(to_string = "BIG_INT", serialize = "bigint")]
    BigInt = 4,
    /// An arbitrary precision decimal.
    #[strum(to_string = "BIG_DECIMAL", serialize = "bigdecimal")]
    BigDecimal = 5,
    /// A UNIX timestamp in seconds.
    Timestamp = 6,
    /// A boolean flag.
    Boolean = 7,
    /// A decimal amount denominated in USD.
    Amount = 8,
    /// A decimal amount denominated in the token named by the column currency field.
    #[strum(to_string = "TOKEN_AMOUNT", serialize = "token")]
    TokenAmount = 9,
    /// An integer amount in the smallest unit of the token named by the column currency field.
    #[strum(to_string = "RAW_TOKEN_AMOUNT", serialize = "raw_token")]
    RawTokenAmount = 10,
}

impl ColumnDataType {
    /// Returns the GraphQL scalar type name of values of this type.
    #[must_use]
    pub const fn graphql_type(self) -> &'static str {
        match self {
            Self::Text => "String",
            Self::Id => "ID",
            Self::Integer => "Int",
            Self::BigInt | Self::Timestamp | Self::RawTokenAmount => "BigInt",
            Self::BigDecimal | Self::Amount | Self::TokenAmount => "BigDecimal",
            Self::Boolean => "Boolean",
        }
    }

    /// Returns true if values of this type are denominated in a token resolved per entity.
    #[must_use]
    pub const fn is_token_amount(self) -> bool {
        matches!(self, Self::TokenAmount | Self::RawTokenAmount)
    }
}
