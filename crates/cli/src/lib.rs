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

//! The `prism` command-line interface for exploring subgraph token and entity data.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]

pub mod commands;
pub mod config;
pub mod logging;
pub mod opt;

use crate::{
    commands::{
        convert::run_convert_command, query::run_query_command, tokens::run_tokens_command,
    },
    config::ExplorerConfig,
    opt::{Commands, PrismCli},
};

/// Runs the command selected by `opt`.
///
/// The configuration is loaded from `--config` (or defaults), then `PRISM_SUBGRAPH_URL`,
/// then `--url`, each overriding the last.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the command fails.
pub async fn run(opt: PrismCli) -> anyhow::Result<()> {
    let config = ExplorerConfig::load(opt.config.as_deref())?.with_subgraph_url(opt.url);
    config.validate()?;

    match opt.command {
        Commands::Tokens(tokens_opt) => run_tokens_command(tokens_opt, &config).await?,
        Commands::Query(query_opt) => run_query_command(query_opt, &config).await?,
        Commands::Convert(convert_opt) => run_convert_command(convert_opt, &config).await?,
    }
    Ok(())
}
