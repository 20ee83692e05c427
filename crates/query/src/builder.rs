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

//! A stateful builder rendering GraphQL documents for subgraph entity queries.
//!
//! Two documents can be built from the same state:
//! - A single-page query using `skip`/`first` offsets, see [`QueryBuilder::build`].
//! - A cursor batch query used for exhaustive fetches, see [`QueryBuilder::build_batch_query`].

use indexmap::IndexMap;
use prism_core::correctness::{check_graphql_name, check_nonempty_string};
use serde::Serialize;
use serde_json::{Map, Value};
use ustr::Ustr;

use crate::{
    enums::{FilterOperator, OrderDirection},
    error::QueryError,
};

/// The maximum number of entities a subgraph returns per request.
pub const MAX_PAGE_SIZE: usize = 1_000;

/// The field batches are keyed on until an order-by field is set.
pub const DEFAULT_CURSOR_FIELD: &str = "id";

/// The GraphQL type of the default cursor field.
pub const DEFAULT_CURSOR_TYPE: &str = "ID";

/// The alias of the entity collection in a batch query response.
pub const BATCH_ALIAS: &str = "batch";

/// A `where` clause condition with its value already rendered as a GraphQL literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    /// The filtered field.
    pub field: Ustr,
    /// The comparison operator.
    pub operator: FilterOperator,
    /// The rendered GraphQL literal.
    pub value: String,
}

impl Filter {
    /// Returns the `where` clause key, the field name followed by the operator suffix.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}{}", self.field, self.operator.suffix())
    }

    fn render(&self) -> String {
        format!("{}: {}", self.key(), self.value)
    }
}

/// A GraphQL document ready to be posted to an endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryDocument {
    /// The query text.
    pub query: String,
    /// The query variables as a JSON object.
    pub variables: Value,
}

/// Builds GraphQL queries for one entity collection.
///
/// Filters are keyed by field, so each field carries at most one filter and adding a filter for
/// a field replaces the previous one while keeping its position.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    body: Option<String>,
    entity_name: Option<Ustr>,
    filters: IndexMap<Ustr, Filter>,
    order_by: Option<Ustr>,
    order_direction: Option<OrderDirection>,
    page: usize,
    page_size: usize,
    cursor_field: Ustr,
    cursor_type: Ustr,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            body: None,
            entity_name: None,
            filters: IndexMap::new(),
            order_by: None,
            order_direction: None,
            page: 0,
            page_size: MAX_PAGE_SIZE,
            cursor_field: Ustr::from(DEFAULT_CURSOR_FIELD),
            cursor_type: Ustr::from(DEFAULT_CURSOR_TYPE),
        }
    }
}

impl QueryBuilder {
    /// Creates a new empty [`QueryBuilder`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the selection set rendered inside the entity braces.
    pub fn set_body(&mut self, body: &str) -> &mut Self {
        self.body = Some(body.trim().to_string());
        self
    }

    /// Sets the entity collection name, e.g. `tokens`.
    pub fn set_entity_name(&mut self, entity_name: &str) -> &mut Self {
        self.entity_name = Some(Ustr::from(entity_name.trim()));
        self
    }

    /// Adds a filter on `field`, replacing any existing filter on that field.
    ///
    /// The `value` must already be a rendered GraphQL literal.
    pub fn add_filter(
        &mut self,
        field: &str,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> &mut Self {
        let field = Ustr::from(field);
        self.filters.insert(
            field,
            Filter {
                field,
                operator,
                value: value.into(),
            },
        );
        self
    }

    /// Removes the filter on `field`, if any.
    pub fn remove_filter(&mut self, field: &str) -> &mut Self {
        self.filters.shift_remove(&Ustr::from(field));
        self
    }

    /// Removes all filters.
    pub fn clear_filters(&mut self) -> &mut Self {
        self.filters.clear();
        self
    }

    /// Sets the order-by field and moves the batch cursor to it.
    ///
    /// The cursor type is reset to `ID` for the `id` field and `String` otherwise; use
    /// [`QueryBuilder::set_cursor_type`] for other field types.
    pub fn set_order_by(&mut self, field: &str) -> &mut Self {
        let field = Ustr::from(field);
        self.order_by = Some(field);
        self.cursor_field = field;
        self.cursor_type = if field.as_str() == DEFAULT_CURSOR_FIELD {
            Ustr::from(DEFAULT_CURSOR_TYPE)
        } else {
            Ustr::from("String")
        };
        self
    }

    /// Sets the sort direction.
    pub fn set_order_direction(&mut self, direction: OrderDirection) -> &mut Self {
        self.order_direction = Some(direction);
        self
    }

    /// Sets the zero-based page index for single-page queries.
    pub fn set_page(&mut self, page: usize) -> &mut Self {
        self.page = page;
        self
    }

    /// Sets the page size, which is capped at [`MAX_PAGE_SIZE`] when rendered.
    pub fn set_page_size(&mut self, page_size: usize) -> &mut Self {
        self.page_size = page_size;
        self
    }

    /// Sets the GraphQL type of the `$lastCursor` batch variable.
    pub fn set_cursor_type(&mut self, cursor_type: &str) -> &mut Self {
        self.cursor_type = Ustr::from(cursor_type);
        self
    }

    /// Returns the selection set, if set.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the entity collection name, if set.
    #[must_use]
    pub const fn entity_name(&self) -> Option<Ustr> {
        self.entity_name
    }

    /// Returns the filter on `field`, if any.
    #[must_use]
    pub fn filter(&self, field: &str) -> Option<&Filter> {
        self.filters.get(&Ustr::from(field))
    }

    /// Returns the filters in insertion order.
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.values()
    }

    /// Returns the order-by field, if set.
    #[must_use]
    pub const fn order_by(&self) -> Option<Ustr> {
        self.order_by
    }

    /// Returns the sort direction, if set.
    #[must_use]
    pub const fn order_direction(&self) -> Option<OrderDirection> {
        self.order_direction
    }

    /// Returns the zero-based page index.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Returns the page size as set.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the page size as rendered, in `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Returns the batch cursor field.
    #[must_use]
    pub const fn cursor_field(&self) -> Ustr {
        self.cursor_field
    }

    /// Returns the GraphQL type of the batch cursor.
    #[must_use]
    pub const fn cursor_type(&self) -> Ustr {
        self.cursor_type
    }

    /// Builds a single-page query.
    ///
    /// Clauses render in the order `where`, `skip`, `first`, `orderBy`, `orderDirection`, with
    /// `where`, `orderBy` and `orderDirection` omitted when unset.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Configuration`] if the body or entity name is missing, or any name
    /// is not a valid GraphQL name.
    pub fn build(&self) -> Result<QueryDocument, QueryError> {
        let (entity_name, body) = self.validate()?;

        let mut clauses = Vec::with_capacity(5);
        if !self.filters.is_empty() {
            let conditions: Vec<String> = self.filters.values().map(Filter::render).collect();
            clauses.push(format!("where: {{{}}}", conditions.join(", ")));
        }
        let page_size = self.effective_page_size();
        clauses.push(format!("skip: {}", page_size.saturating_mul(self.page)));
        clauses.push(format!("first: {page_size}"));
        if let Some(order_by) = self.order_by {
            clauses.push(format!("orderBy: {order_by}"));
        }
        if let Some(direction) = self.order_direction {
            clauses.push(format!("orderDirection: {direction}"));
        }

        Ok(QueryDocument {
            query: format!(
                "query {{ {entity_name}({}) {{ {body} }} }}",
                clauses.join(", ")
            ),
            variables: Value::Object(Map::new()),
        })
    }

    /// Builds a cursor batch query returning the entities after `last_cursor`.
    ///
    /// Without a cursor the forced cursor filter and its variable are omitted. With a cursor the
    /// condition `<cursor field>_gt` (or `_lt` when descending) replaces any user filter with the
    /// same key. The entity collection is aliased as [`BATCH_ALIAS`].
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Configuration`] under the same conditions as
    /// [`QueryBuilder::build`], or if the cursor type is not a valid GraphQL name.
    pub fn build_batch_query(&self, last_cursor: Option<&Value>) -> Result<QueryDocument, QueryError> {
        let (entity_name, body) = self.validate()?;
        check_graphql_name(self.cursor_type, "cursor_type").map_err(configuration)?;

        let direction = self.order_direction.unwrap_or_default();
        let cursor_filter = Filter {
            field: self.cursor_field,
            operator: direction.cursor_operator(),
            value: "$lastCursor".to_string(),
        };
        let cursor_key = cursor_filter.key();

        let page_size = self.effective_page_size();
        let mut variables = Map::new();
        variables.insert("pageSize".to_string(), Value::from(page_size));

        let mut header = "$pageSize: Int!".to_string();
        let mut conditions: Vec<String> = self
            .filters
            .values()
            .filter(|filter| last_cursor.is_none() || filter.key() != cursor_key)
            .map(Filter::render)
            .collect();

        if let Some(cursor) = last_cursor {
            header.push_str(&format!(", $lastCursor: {}!", self.cursor_type));
            conditions.push(cursor_filter.render());
            variables.insert("lastCursor".to_string(), cursor.clone());
        }

        let mut clauses = vec!["first: $pageSize".to_string()];
        if !conditions.is_empty() {
            clauses.push(format!("where: {{{}}}", conditions.join(", ")));
        }
        clauses.push(format!("orderBy: {}", self.cursor_field));
        clauses.push(format!("orderDirection: {direction}"));

        Ok(QueryDocument {
            query: format!(
                "query Batch({header}) {{ {BATCH_ALIAS}: {entity_name}({}) {{ {body} }} }}",
                clauses.join(", ")
            ),
            variables: Value::Object(variables),
        })
    }

    fn validate(&self) -> Result<(Ustr, &str), QueryError> {
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| QueryError::Configuration("query body is not set".to_string()))?;
        check_nonempty_string(body, "body").map_err(configuration)?;

        let entity_name = self
            .entity_name
            .ok_or_else(|| QueryError::Configuration("entity name is not set".to_string()))?;
        check_graphql_name(entity_name, "entity_name").map_err(configuration)?;

        for field in self.filters.keys() {
            check_graphql_name(field, "filter field").map_err(configuration)?;
        }
        if let Some(order_by) = self.order_by {
            check_graphql_name(order_by, "order_by").map_err(configuration)?;
        }
        check_graphql_name(self.cursor_field, "cursor_field").map_err(configuration)?;

        Ok((entity_name, body))
    }
}

#[allow(clippy::needless_pass_by_value)]
fn configuration(error: anyhow::Error) -> QueryError {
    QueryError::Configuration(error.to_string())
}
