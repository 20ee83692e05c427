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

//! Entity descriptors: per-entity query configuration as plain data.

use std::{fmt::Debug, sync::Arc};

use prism_core::correctness::{FAILED, check_graphql_name, check_nonempty_string, check_predicate_false};
use prism_model::{
    registry::CurrencyRegistry,
    types::{Currency, SharedCurrency},
};
use serde_json::Value;
use ustr::Ustr;

use crate::{
    builder::QueryBuilder,
    column::ColumnDescriptor,
    enums::{ColumnDataType, OrderDirection},
    row::{Cell, Row, amount_cell, decimal_cell, entity_i64, raw_amount_cell},
};

/// Maps one fetched entity into a table row.
pub type RowMapper = Arc<dyn Fn(&Value) -> anyhow::Result<Row> + Send + Sync>;

/// Describes how to query and map one subgraph entity collection.
#[derive(Clone)]
pub struct EntityDescriptor {
    /// The entity collection name, e.g. `tokens`.
    pub entity_name: Ustr,
    /// The selection set requested for each entity.
    pub body: String,
    /// The table columns in display order.
    pub columns: Arc<[ColumnDescriptor]>,
    /// The order-by field applied on reset, if any.
    pub default_order_by: Option<Ustr>,
    /// The sort direction applied on reset, if any.
    pub default_order_direction: Option<OrderDirection>,
    row_mapper: RowMapper,
}

impl EntityDescriptor {
    /// Creates a new [`EntityDescriptor`] instance with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `entity_name` is not a valid GraphQL name.
    /// - `body` is empty.
    /// - `columns` is empty.
    pub fn new_checked(
        entity_name: &str,
        body: &str,
        columns: Vec<ColumnDescriptor>,
        row_mapper: RowMapper,
    ) -> anyhow::Result<Self> {
        check_graphql_name(entity_name, "entity_name")?;
        check_nonempty_string(body.trim(), "body")?;
        check_predicate_false(columns.is_empty(), "columns was empty")?;

        Ok(Self {
            entity_name: Ustr::from(entity_name),
            body: body.trim().to_string(),
            columns: columns.into(),
            default_order_by: None,
            default_order_direction: None,
            row_mapper,
        })
    }

    /// Creates a new [`EntityDescriptor`] instance.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails. See [`EntityDescriptor::new_checked`] for more details.
    #[must_use]
    pub fn new(
        entity_name: &str,
        body: &str,
        columns: Vec<ColumnDescriptor>,
        row_mapper: RowMapper,
    ) -> Self {
        Self::new_checked(entity_name, body, columns, row_mapper).expect(FAILED)
    }

    /// Creates a descriptor selecting exactly the column fields, mapped by data type.
    ///
    /// See [`column_cell`] for how each data type maps.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`EntityDescriptor::new_checked`], or if
    /// any column is a token amount, which needs [`EntityDescriptor::from_columns_with_registry`].
    pub fn from_columns(entity_name: &str, columns: Vec<ColumnDescriptor>) -> anyhow::Result<Self> {
        if let Some(column) = columns.iter().find(|column| column.data_type.is_token_amount()) {
            anyhow::bail!(
                "token amount column '{}' needs a currency registry",
                column.field
            );
        }
        Self::mapped_by_columns(entity_name, columns, None)
    }

    /// Creates a descriptor selecting the column fields, resolving token amount currencies
    /// through `registry`.
    ///
    /// The selection also requests the `id` of every currency field not itself selected as a
    /// column.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`EntityDescriptor::new_checked`], or if a
    /// token amount column has no currency field.
    pub fn from_columns_with_registry(
        entity_name: &str,
        columns: Vec<ColumnDescriptor>,
        registry: Arc<CurrencyRegistry>,
    ) -> anyhow::Result<Self> {
        for column in columns.iter().filter(|column| column.data_type.is_token_amount()) {
            check_predicate_false(
                column.currency_field.is_none(),
                &format!("token amount column '{}' has no currency field", column.field),
            )?;
        }
        Self::mapped_by_columns(entity_name, columns, Some(registry))
    }

    fn mapped_by_columns(
        entity_name: &str,
        columns: Vec<ColumnDescriptor>,
        registry: Option<Arc<CurrencyRegistry>>,
    ) -> anyhow::Result<Self> {
        let body = selection_body(&columns);
        let mapped: Arc<[ColumnDescriptor]> = columns.clone().into();
        let row_mapper: RowMapper =
            Arc::new(move |entity: &Value| map_columns(entity, &mapped, registry.as_deref()));
        Self::new_checked(entity_name, &body, columns, row_mapper)
    }

    /// Returns this descriptor with a default ordering applied on reset.
    #[must_use]
    pub fn with_default_order(mut self, field: &str, direction: OrderDirection) -> Self {
        self.default_order_by = Some(Ustr::from(field));
        self.default_order_direction = Some(direction);
        self
    }

    /// Returns the column for `field`, if any.
    #[must_use]
    pub fn column(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.field.as_str() == field)
    }

    /// Maps a fetched entity into a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row mapper rejects the entity.
    pub fn map_entity(&self, entity: &Value) -> anyhow::Result<Row> {
        (self.row_mapper)(entity)
    }

    /// Returns a builder configured from this descriptor.
    #[must_use]
    pub fn builder(&self) -> QueryBuilder {
        let mut builder = QueryBuilder::new();
        builder
            .set_entity_name(&self.entity_name)
            .set_body(&self.body);
        if let Some(field) = self.default_order_by {
            builder.set_order_by(&field);
            if let Some(column) = self.column(&field) {
                builder.set_cursor_type(column.data_type.graphql_type());
            }
        }
        if let Some(direction) = self.default_order_direction {
            builder.set_order_direction(direction);
        }
        builder
    }
}

impl Debug for EntityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(EntityDescriptor))
            .field("entity_name", &self.entity_name)
            .field("body", &self.body)
            .field("columns", &self.columns)
            .field("default_order_by", &self.default_order_by)
            .field("default_order_direction", &self.default_order_direction)
            .finish_non_exhaustive()
    }
}

fn selection_body(columns: &[ColumnDescriptor]) -> String {
    let mut selections: Vec<String> = columns.iter().map(|column| column.field.to_string()).collect();
    for currency_field in columns.iter().filter_map(|column| column.currency_field) {
        let selection = format!("{currency_field} {{ id }}");
        if columns.iter().all(|column| column.field != currency_field)
            && !selections.contains(&selection)
        {
            selections.push(selection);
        }
    }
    selections.join(" ")
}

/// Maps the value of `column` in `entity` according to the column data type.
///
/// Missing and null values map to [`Cell::Empty`]. Big integers beyond the `i64` range map to
/// text and amount columns are denominated in USD. Token amount columns are denominated in the
/// currency resolved by [`resolve_currency`], and map to [`Cell::Empty`] without a registry or
/// when the currency is unknown.
///
/// # Errors
///
/// Returns an error if a present value does not match the column data type.
pub fn column_cell(
    entity: &Value,
    column: &ColumnDescriptor,
    registry: Option<&CurrencyRegistry>,
) -> anyhow::Result<Cell> {
    let field = column.field.as_str();
    let value = match entity.get(field) {
        None | Some(Value::Null) => return Ok(Cell::Empty),
        Some(value) => value,
    };

    match column.data_type {
        ColumnDataType::Text | ColumnDataType::Id => match value {
            Value::String(s) => Ok(Cell::Text(s.clone())),
            Value::Number(_) | Value::Bool(_) => Ok(Cell::Text(value.to_string())),
            other => anyhow::bail!("field '{field}' is not a scalar: {other}"),
        },
        ColumnDataType::Integer => Ok(Cell::Integer(entity_i64(entity, field)?)),
        ColumnDataType::BigInt => match entity_i64(entity, field) {
            Ok(integer) => Ok(Cell::Integer(integer)),
            Err(_) => decimal_cell(entity, field),
        },
        ColumnDataType::BigDecimal => decimal_cell(entity, field),
        ColumnDataType::Timestamp => Ok(Cell::Timestamp(entity_i64(entity, field)?)),
        ColumnDataType::Boolean => value
            .as_bool()
            .map(Cell::Boolean)
            .ok_or_else(|| anyhow::anyhow!("field '{field}' is not a boolean: {value}")),
        ColumnDataType::Amount => amount_cell(entity, field, &Currency::USD()),
        ColumnDataType::TokenAmount | ColumnDataType::RawTokenAmount => {
            let Some(currency) = registry.and_then(|registry| resolve_currency(entity, column, registry))
            else {
                return Ok(Cell::Empty);
            };
            if column.data_type == ColumnDataType::RawTokenAmount {
                raw_amount_cell(entity, field, &currency)
            } else {
                amount_cell(entity, field, &currency)
            }
        }
    }
}

/// Returns the currency of a token amount `column` for `entity`.
///
/// The currency field holds the token id, either directly or as the `id` of a nested object.
/// Returns `None` if the column has no currency field, the id is missing, or `registry` does not
/// know the id.
#[must_use]
pub fn resolve_currency(
    entity: &Value,
    column: &ColumnDescriptor,
    registry: &CurrencyRegistry,
) -> Option<SharedCurrency> {
    let id = match entity.get(column.currency_field?.as_str())? {
        Value::String(id) => id.as_str(),
        Value::Object(object) => object.get("id")?.as_str()?,
        _ => return None,
    };

    let currency = registry
        .get_by_id(id)
        .or_else(|| registry.get_by_id(&id.to_ascii_lowercase()))
        .cloned();
    if currency.is_none() {
        log::debug!("Unknown currency '{id}' for column '{}'", column.field);
    }
    currency
}

/// Maps `entity` into a row with one cell per column.
///
/// # Errors
///
/// Returns an error if any column value cannot be mapped.
pub fn map_columns(
    entity: &Value,
    columns: &[ColumnDescriptor],
    registry: Option<&CurrencyRegistry>,
) -> anyhow::Result<Row> {
    columns
        .iter()
        .map(|column| Ok((column.field, column_cell(entity, column, registry)?)))
        .collect()
}
