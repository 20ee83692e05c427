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

//! The `convert` command: converts an amount between currencies through USD.

use prism_core::datetime::{parse_unix_secs, unix_timestamp_secs};
use prism_model::{
    registry::CurrencyRegistry,
    types::{Amount, DisplayOptions, SharedCurrency},
};
use prism_query::catalog::currencies::load_currency_registry;

use crate::{
    commands::{connect, shutdown_token},
    config::ExplorerConfig,
    opt::ConvertOpt,
};

/// Runs the `convert` command.
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded or the arguments are invalid.
pub async fn run_convert_command(opt: ConvertOpt, config: &ExplorerConfig) -> anyhow::Result<()> {
    let timestamp = opt.at.as_deref().map(parse_unix_secs).transpose()?;

    let executor = connect(config)?;
    let registry =
        load_currency_registry(executor, &config.currency_load_config(), &shutdown_token()).await?;

    let (amount, converted) = convert(
        &registry,
        &opt.amount,
        &opt.from,
        &opt.to,
        timestamp,
        unix_timestamp_secs(),
    )?;

    let options = DisplayOptions::default();
    match converted {
        Some(converted) => println!(
            "{} = {}",
            amount.to_display_string(options),
            converted.to_display_string(options)
        ),
        None => println!("{}: no price available for {}", amount.to_display_string(options), opt.to),
    }
    Ok(())
}

/// Converts `amount` of the currency `from` into `to`, at the hour of `timestamp` if given.
///
/// Returns the parsed amount with its conversion, which is `None` when no price applies.
///
/// # Errors
///
/// Returns an error if either currency is unknown or the amount does not parse.
pub fn convert(
    registry: &CurrencyRegistry,
    amount: &str,
    from: &str,
    to: &str,
    timestamp: Option<i64>,
    now: i64,
) -> anyhow::Result<(Amount, Option<Amount>)> {
    let from = lookup(registry, from)?;
    let to = lookup(registry, to)?;
    let amount = Amount::from_decimal_str(amount, from)?;
    let converted = Amount::from_token_at(&amount, &to, timestamp, now);
    Ok((amount, converted))
}

fn lookup(registry: &CurrencyRegistry, key: &str) -> anyhow::Result<SharedCurrency> {
    registry
        .get(key)
        .or_else(|| registry.get(&key.to_lowercase()))
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Unknown currency '{key}'"))
}
