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

//! The `tokens` command: lists the currency registry with USD spot prices.

use prism_model::{registry::CurrencyRegistry, types::DisplayOptions};
use prism_query::{
    catalog::currencies::{currency_descriptor, currency_row, load_currency_registry},
    row::Row,
};

use crate::{
    commands::{connect, render_table, shutdown_token},
    config::ExplorerConfig,
    opt::TokensOpt,
};

/// Runs the `tokens` command.
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded or the output cannot be serialized.
pub async fn run_tokens_command(opt: TokensOpt, config: &ExplorerConfig) -> anyhow::Result<()> {
    let executor = connect(config)?;
    let registry =
        load_currency_registry(executor, &config.currency_load_config(), &shutdown_token()).await?;

    let rows = select_rows(&registry, opt.symbol.as_deref(), opt.limit);
    log::info!("Listing {} of {} currencies", rows.len(), registry.len() - 1);

    if opt.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let options = if opt.abbreviate {
            DisplayOptions::abbreviated()
        } else {
            DisplayOptions::default()
        };
        let descriptor = currency_descriptor(config.token_hour_data_limit);
        print!("{}", render_table(&descriptor.columns, &rows, options));
    }
    Ok(())
}

/// Returns the rows of the registered tokens, excluding USD, in registration order.
///
/// `symbol` matches a symbol or identifier case-insensitively.
#[must_use]
pub fn select_rows(registry: &CurrencyRegistry, symbol: Option<&str>, limit: Option<usize>) -> Vec<Row> {
    registry
        .iter()
        .filter(|currency| !currency.is_usd())
        .filter(|currency| {
            symbol.is_none_or(|key| {
                currency.symbol.as_str().eq_ignore_ascii_case(key)
                    || currency.id.as_str().eq_ignore_ascii_case(key)
            })
        })
        .take(limit.unwrap_or(usize::MAX))
        .map(|currency| currency_row(currency))
        .collect()
}
