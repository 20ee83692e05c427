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

//! Logging initialization for the `prism` binary.

use tracing_subscriber::EnvFilter;

/// The environment variable holding the log filter directives.
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

/// The filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Returns the filter directives to use, preferring a non-blank `env_value`.
#[must_use]
pub fn resolve_log_filter(env_value: Option<String>, default: &str) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Initializes a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`.
///
/// Records emitted through the `log` facade are captured as well.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let directives = resolve_log_filter(std::env::var(LOG_FILTER_ENV).ok(), default_filter);
    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{directives}': {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))?;

    Ok(())
}
