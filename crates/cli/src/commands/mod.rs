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

//! Implementations of the `prism` subcommands.

pub mod convert;
pub mod query;
pub mod tokens;

use std::sync::Arc;

use prism_model::types::DisplayOptions;
use prism_network::http::GraphQlHttpClient;
use prism_query::{column::ColumnDescriptor, executor::QueryExecutor, row::Row};
use tokio_util::sync::CancellationToken;

use crate::config::ExplorerConfig;

/// Creates the subgraph executor for `config`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn connect(config: &ExplorerConfig) -> anyhow::Result<Arc<dyn QueryExecutor>> {
    let client = GraphQlHttpClient::new(&config.subgraph_url, config.http_timeout_secs)?;
    log::info!("Querying subgraph at {}", config.subgraph_url);
    Ok(Arc::new(client))
}

/// Returns a token which is canceled on Ctrl-C.
#[must_use]
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, canceling after the request in flight");
            on_signal.cancel();
        }
    });
    token
}

/// Renders `rows` as a left-aligned text table headed by the column headers.
#[must_use]
pub fn render_table(columns: &[ColumnDescriptor], rows: &[Row], options: DisplayOptions) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    row.get(&column.field)
                        .map(|cell| cell.to_display_string(options))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|line| line[i].chars().count())
                .fold(column.header.chars().count(), usize::max)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, columns.iter().map(|column| column.header.as_str()), &widths);
    for line in &cells {
        push_line(&mut out, line.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, values: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = values
        .zip(widths.iter().copied())
        .map(|(value, width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use prism_model::types::{Amount, Currency};
    use prism_query::{enums::ColumnDataType, row::Cell};
    use rstest::rstest;
    use ustr::Ustr;

    use super::*;

    #[rstest]
    fn test_render_table() {
        let columns = vec![
            ColumnDescriptor::new("symbol", "Symbol", ColumnDataType::Text),
            ColumnDescriptor::new("priceUSD", "Price", ColumnDataType::Amount),
        ];
        let mut weth = Row::new();
        weth.insert(Ustr::from("symbol"), Cell::Text("WETH".to_string()));
        weth.insert(
            Ustr::from("priceUSD"),
            Cell::Amount(Amount::from_decimal_str("2000", Currency::USD()).unwrap()),
        );
        let mut unpriced = Row::new();
        unpriced.insert(Ustr::from("symbol"), Cell::Text("SHIBAINU".to_string()));
        unpriced.insert(Ustr::from("priceUSD"), Cell::Empty);

        let table = render_table(&columns, &[weth, unpriced], DisplayOptions::default());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Symbol    Price"));
        assert!(lines[1].starts_with("WETH      "));
        assert!(lines[1].contains("2,000.00"));
        assert_eq!(lines[2], "SHIBAINU");
    }

    #[rstest]
    fn test_render_table_without_rows() {
        let columns = vec![ColumnDescriptor::new("id", "Address", ColumnDataType::Id)];
        assert_eq!(render_table(&columns, &[], DisplayOptions::default()), "Address\n");
    }

    #[rstest]
    fn test_connect_rejects_invalid_url() {
        let config = ExplorerConfig::default().with_subgraph_url(Some("not a url".to_string()));
        assert!(connect(&config).is_err());
    }
}
