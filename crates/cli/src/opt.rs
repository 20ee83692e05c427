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

use std::path::PathBuf;

use clap::Parser;

/// Main CLI structure for parsing command-line arguments and options.
///
/// This is the entry point for the Prism command-line interface, giving access to
/// token listings, ad-hoc entity queries and currency conversions against a subgraph.
#[derive(Debug, Parser)]
#[clap(version, about, author)]
pub struct PrismCli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Subgraph endpoint URL (overrides the configuration file and `PRISM_SUBGRAPH_URL`).
    #[arg(long, global = true)]
    pub url: Option<String>,
    #[clap(subcommand)]
    pub command: Commands,
}

/// Available top-level commands for the Prism CLI.
#[derive(Parser, Debug)]
pub enum Commands {
    Tokens(TokensOpt),
    Query(QueryOpt),
    Convert(ConvertOpt),
}

/// Options for listing the currency registry.
#[derive(Parser, Debug, Clone)]
#[command(about = "List tokens with their USD spot prices", long_about = None)]
pub struct TokensOpt {
    /// Only list currencies with this symbol or identifier (case-insensitive).
    #[arg(long)]
    pub symbol: Option<String>,
    /// Maximum number of currencies to print.
    #[arg(long)]
    pub limit: Option<usize>,
    /// Abbreviate large prices, e.g. `$1.2k`.
    #[arg(long)]
    pub abbreviate: bool,
    /// Print rows as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Options for an ad-hoc entity query.
#[derive(Parser, Debug, Clone)]
#[command(about = "Query a subgraph entity collection", long_about = None)]
pub struct QueryOpt {
    /// The entity collection to query, e.g. `tokens` or `pools`.
    pub entity: String,
    /// Fields to select as `name[:type]`, where type is one of text, id, integer,
    /// bigint, bigdecimal, timestamp, boolean or amount (default text).
    /// Optional for `tokens`, which has a built-in column set.
    #[arg(long = "field", value_delimiter = ',')]
    pub fields: Vec<String>,
    /// Filters as `field:operator:value`, e.g. `symbol:eq:WETH` or `id:in:0x1,0x2`.
    #[arg(long = "filter")]
    pub filters: Vec<String>,
    /// Field to order by.
    #[arg(long)]
    pub order_by: Option<String>,
    /// Order descending instead of ascending.
    #[arg(long)]
    pub desc: bool,
    /// Zero-based page index for a single page fetch.
    #[arg(long, default_value_t = 0)]
    pub page: usize,
    /// Number of rows per page (defaults to the configured page size).
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Fetch every matching entity in batches instead of a single page.
    #[arg(long)]
    pub all: bool,
}

/// Options for converting an amount between currencies.
#[derive(Parser, Debug, Clone)]
#[command(about = "Convert an amount between currencies through USD", long_about = None)]
pub struct ConvertOpt {
    /// The amount in display units, e.g. `1.5`.
    pub amount: String,
    /// The currency of the amount, by symbol or identifier.
    pub from: String,
    /// The target currency, by symbol or identifier (`USD` for dollars).
    pub to: String,
    /// Convert at the hour of this timestamp (UNIX seconds, RFC 3339 or `YYYY-MM-DD`).
    #[arg(long)]
    pub at: Option<String>,
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_cli_definition_is_valid() {
        PrismCli::command().debug_assert();
    }

    #[rstest]
    fn test_parse_query_command() {
        let cli = PrismCli::try_parse_from([
            "prism",
            "query",
            "pools",
            "--field",
            "id:id,feeTier:bigint",
            "--filter",
            "feeTier:eq:500",
            "--desc",
            "--all",
            "--url",
            "http://localhost:8000",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("http://localhost:8000"));
        match cli.command {
            Commands::Query(opt) => {
                assert_eq!(opt.entity, "pools");
                assert_eq!(opt.fields, vec!["id:id", "feeTier:bigint"]);
                assert_eq!(opt.filters, vec!["feeTier:eq:500"]);
                assert!(opt.desc);
                assert!(opt.all);
                assert_eq!(opt.page, 0);
                assert_eq!(opt.page_size, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[rstest]
    fn test_parse_convert_command() {
        let cli = PrismCli::try_parse_from(["prism", "convert", "1.5", "WETH", "USDC", "--at", "2024-02-10"])
            .unwrap();

        match cli.command {
            Commands::Convert(opt) => {
                assert_eq!(opt.amount, "1.5");
                assert_eq!(opt.from, "WETH");
                assert_eq!(opt.to, "USDC");
                assert_eq!(opt.at.as_deref(), Some("2024-02-10"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[rstest]
    fn test_parse_rejects_missing_subcommand() {
        assert!(PrismCli::try_parse_from(["prism"]).is_err());
    }
}
