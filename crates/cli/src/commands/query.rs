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

//! The `query` command: fetches a page, or every row, of an entity collection as JSON.

use std::str::FromStr;

use prism_query::{
    catalog::tokens::{TOKENS_ENTITY, tokens_descriptor},
    column::ColumnDescriptor,
    descriptor::EntityDescriptor,
    enums::{ColumnDataType, FilterOperator, OrderDirection},
    paged::PagedQuery,
};

use crate::{
    commands::{connect, shutdown_token},
    config::ExplorerConfig,
    opt::QueryOpt,
};

/// Runs the `query` command.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, the fetch fails, or the rows cannot be
/// serialized.
pub async fn run_query_command(opt: QueryOpt, config: &ExplorerConfig) -> anyhow::Result<()> {
    let descriptor = build_descriptor(&opt)?;
    let mut query = PagedQuery::new_checked(descriptor, connect(config)?, config.paged_query_config())?;
    configure_query(&mut query, &opt, config.page_size)?;

    let token = shutdown_token();
    let result = if opt.all {
        query.fetch_all_with_cancel(&token).await?
    } else {
        query.fetch_with_cancel(&token).await?
    };

    if token.is_cancelled() {
        log::warn!("Query canceled, printing {} rows fetched so far", result.len());
    } else {
        log::info!("Fetched {} {}", result.len(), opt.entity);
    }
    println!("{}", serde_json::to_string_pretty(&result.rows)?);
    Ok(())
}

/// Returns the descriptor for the entity and `--field` arguments of `opt`.
///
/// The token collection has a built-in column set used when no fields are given.
///
/// # Errors
///
/// Returns an error if a field argument is invalid, or no fields are given for an entity
/// without a built-in column set.
pub fn build_descriptor(opt: &QueryOpt) -> anyhow::Result<EntityDescriptor> {
    if opt.fields.is_empty() {
        if opt.entity == TOKENS_ENTITY {
            return Ok(tokens_descriptor());
        }
        anyhow::bail!("No fields given for '{}', use --field name[:type]", opt.entity);
    }

    let columns = opt
        .fields
        .iter()
        .map(|arg| parse_field_arg(arg))
        .collect::<anyhow::Result<Vec<_>>>()?;
    EntityDescriptor::from_columns(&opt.entity, columns)
}

/// Applies the filter, ordering and paging arguments of `opt` to `query`.
///
/// # Errors
///
/// Returns an error if a filter argument or value is invalid.
pub fn configure_query(
    query: &mut PagedQuery,
    opt: &QueryOpt,
    default_page_size: usize,
) -> anyhow::Result<()> {
    for arg in &opt.filters {
        let (field, operator, value) = parse_filter_arg(arg)?;
        query.add_filter(&field, operator, &value)?;
    }
    if let Some(order_by) = &opt.order_by {
        query.set_order_by(order_by);
    }
    if opt.desc {
        query.set_order_direction(OrderDirection::Desc);
    }
    query
        .set_page(opt.page)
        .set_page_size(opt.page_size.unwrap_or(default_page_size));
    Ok(())
}

/// Parses a `field:operator:value` filter argument.
///
/// Only the first two colons separate, so values may contain colons.
///
/// # Errors
///
/// Returns an error if the argument has fewer than three parts or the operator is unknown.
pub fn parse_filter_arg(arg: &str) -> anyhow::Result<(String, FilterOperator, String)> {
    let mut parts = arg.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(field), Some(operator), Some(value)) if !field.trim().is_empty() => {
            let operator = FilterOperator::from_str(operator.trim())
                .map_err(|_| anyhow::anyhow!("Unknown filter operator '{operator}' in '{arg}'"))?;
            Ok((field.trim().to_string(), operator, value.to_string()))
        }
        _ => anyhow::bail!("Invalid filter '{arg}', expected field:operator:value"),
    }
}

/// Parses a `name[:type]` field argument into a column headed by its name.
///
/// # Errors
///
/// Returns an error if the type is unknown or the name is not a valid GraphQL name.
pub fn parse_field_arg(arg: &str) -> anyhow::Result<ColumnDescriptor> {
    let (field, data_type) = match arg.split_once(':') {
        Some((field, data_type)) => {
            let data_type = ColumnDataType::from_str(data_type.trim())
                .map_err(|_| anyhow::anyhow!("Unknown column type '{data_type}' in '{arg}'"))?;
            (field.trim(), data_type)
        }
        None => (arg.trim(), ColumnDataType::Text),
    };
    ColumnDescriptor::new_checked(field, field, data_type)
}
