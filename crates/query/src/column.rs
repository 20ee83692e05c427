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

//! Column descriptors for entity queries.

use std::fmt::Debug;

use prism_core::correctness::{FAILED, check_graphql_name, check_nonempty_string};
use ustr::Ustr;

use crate::{
    enums::{ColumnDataType, FilterOperator},
    parsers::{FilterValueParser, default_parser, parse_list_literal, parse_string_literal},
};

/// Describes one column of an entity query: its field, header, data type and filter parser.
#[derive(Clone)]
pub struct ColumnDescriptor {
    /// The entity field name.
    pub field: Ustr,
    /// The human readable column header.
    pub header: String,
    /// The data type of the column values.
    pub data_type: ColumnDataType,
    /// The parser applied to raw filter values, if the column declares one.
    pub parser: Option<FilterValueParser>,
    /// The sibling field holding the token id of token amount columns, either the id itself
    /// or an object with an `id` field.
    pub currency_field: Option<Ustr>,
}

impl ColumnDescriptor {
    /// Creates a new [`ColumnDescriptor`] instance with correctness checking.
    ///
    /// The column uses the default parser of its data type.
    ///
    /// # Errors
    ///
    /// Returns an error if `field` is not a valid GraphQL name or `header` is empty.
    pub fn new_checked(field: &str, header: &str, data_type: ColumnDataType) -> anyhow::Result<Self> {
        check_graphql_name(field, "field")?;
        check_nonempty_string(header, "header")?;

        Ok(Self {
            field: Ustr::from(field),
            header: header.to_string(),
            data_type,
            parser: Some(default_parser(data_type)),
            currency_field: None,
        })
    }

    /// Creates a new [`ColumnDescriptor`] instance.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails. See [`ColumnDescriptor::new_checked`] for more details.
    #[must_use]
    pub fn new(field: &str, header: &str, data_type: ColumnDataType) -> Self {
        Self::new_checked(field, header, data_type).expect(FAILED)
    }

    /// Returns this column with a custom filter parser.
    #[must_use]
    pub fn with_parser(mut self, parser: FilterValueParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Returns this column denominated in the token whose id is held by `field`.
    ///
    /// # Panics
    ///
    /// Panics if `field` is not a valid GraphQL name.
    #[must_use]
    pub fn with_currency_field(mut self, field: &str) -> Self {
        check_graphql_name(field, "currency_field").expect(FAILED);
        self.currency_field = Some(Ustr::from(field));
        self
    }

    /// Returns this column without a filter parser, so values are quoted as plain strings.
    #[must_use]
    pub fn without_parser(mut self) -> Self {
        self.parser = None;
        self
    }

    /// Parses a raw filter value for `operator` into a GraphQL literal.
    ///
    /// # Errors
    ///
    /// Returns an error if the column parser rejects the value.
    pub fn parse_filter_value(&self, operator: FilterOperator, value: &str) -> anyhow::Result<String> {
        parse_filter_value(self.parser, operator, value)
    }
}

impl Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ColumnDescriptor))
            .field("field", &self.field)
            .field("header", &self.header)
            .field("data_type", &self.data_type)
            .field("has_parser", &self.parser.is_some())
            .field("currency_field", &self.currency_field)
            .finish()
    }
}

/// Parses a raw filter value with `parser`, falling back to string quoting.
///
/// The is-any-of operator splits the value on commas and renders a list.
///
/// # Errors
///
/// Returns an error if the parser rejects the value or any list item.
pub fn parse_filter_value(
    parser: Option<FilterValueParser>,
    operator: FilterOperator,
    value: &str,
) -> anyhow::Result<String> {
    let parser = parser.unwrap_or(parse_string_literal);
    match operator {
        FilterOperator::IsAnyOf => parse_list_literal(value, parser),
        _ => parser(value),
    }
}
