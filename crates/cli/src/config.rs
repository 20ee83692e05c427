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

//! Configuration for the `prism` binary, loaded from TOML with environment and flag overrides.

use std::path::Path;

use prism_core::correctness::{
    check_in_range_inclusive_usize, check_positive_u32, check_valid_string,
};
use prism_network::retry::RetryConfig;
use prism_query::{
    builder::MAX_PAGE_SIZE,
    catalog::currencies::{CurrencyLoadConfig, DEFAULT_TOKEN_HOUR_DATA_LIMIT},
    paged::PagedQueryConfig,
};
use serde::{Deserialize, Serialize};

/// The environment variable overriding the configured subgraph URL.
pub const SUBGRAPH_URL_ENV: &str = "PRISM_SUBGRAPH_URL";

/// The subgraph queried when none is configured.
pub const DEFAULT_SUBGRAPH_URL: &str = "https://api.thegraph.com/subgraphs/name/uniswap/uniswap-v3";

/// Configuration for the explorer CLI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    /// The GraphQL endpoint of the subgraph.
    pub subgraph_url: String,
    /// The HTTP request timeout in seconds, if any.
    pub http_timeout_secs: Option<u64>,
    /// The default number of rows per page.
    pub page_size: usize,
    /// The number of attempts for a single-page fetch.
    pub fetch_max_attempts: u32,
    /// Backoff settings shared by page and batch fetches.
    pub retry: RetryConfig,
    /// The number of most recent hourly prices loaded per token.
    pub token_hour_data_limit: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            subgraph_url: DEFAULT_SUBGRAPH_URL.to_string(),
            http_timeout_secs: Some(30),
            page_size: MAX_PAGE_SIZE,
            fetch_max_attempts: 10,
            retry: RetryConfig::default(),
            token_hour_data_limit: DEFAULT_TOKEN_HOUR_DATA_LIMIT,
        }
    }
}

impl ExplorerConfig {
    /// Parses a configuration from TOML, with missing keys taking their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or contains unknown keys.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))
    }

    /// Reads a configuration from the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config '{}': {e}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Loads the configuration from `path` (or defaults), then applies the
    /// `PRISM_SUBGRAPH_URL` environment override.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_subgraph_url(std::env::var(SUBGRAPH_URL_ENV).ok()))
    }

    /// Returns this configuration with the subgraph URL replaced, if `url` is set.
    #[must_use]
    pub fn with_subgraph_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.subgraph_url = url;
        }
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is blank, or the page size or attempt count is out of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_valid_string(&self.subgraph_url, "subgraph_url")?;
        check_in_range_inclusive_usize(self.page_size, 1, MAX_PAGE_SIZE, "page_size")?;
        check_positive_u32(self.fetch_max_attempts, "fetch_max_attempts")?;
        check_in_range_inclusive_usize(
            self.token_hour_data_limit,
            1,
            MAX_PAGE_SIZE,
            "token_hour_data_limit",
        )?;
        Ok(())
    }

    /// Returns the retry configuration for paged queries.
    ///
    /// Single-page fetches are limited to `fetch_max_attempts`, batches retry until canceled.
    #[must_use]
    pub fn paged_query_config(&self) -> PagedQueryConfig {
        PagedQueryConfig {
            fetch_retry: self.retry.clone().with_max_attempts(self.fetch_max_attempts),
            batch_retry: self.retry.clone().unbounded(),
        }
    }

    /// Returns the configuration for loading the currency registry.
    #[must_use]
    pub fn currency_load_config(&self) -> CurrencyLoadConfig {
        CurrencyLoadConfig {
            page_size: self.page_size,
            token_hour_data_limit: self.token_hour_data_limit,
            query: self.paged_query_config(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_default_config_is_valid() {
        let config = ExplorerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size, 1_000);
        assert_eq!(config.fetch_max_attempts, 10);
    }

    #[rstest]
    fn test_from_toml_str_partial() {
        let config = ExplorerConfig::from_toml_str(
            r#"
            subgraph_url = "http://localhost:8000/subgraphs/name/test"
            page_size = 250

            [retry]
            initial_delay_ms = 100
            max_delay_ms = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.subgraph_url, "http://localhost:8000/subgraphs/name/test");
        assert_eq!(config.page_size, 250);
        assert_eq!(config.retry.initial_delay_ms, 100);
        assert_eq!(config.retry.max_delay_ms, 5_000);
        assert_eq!(config.fetch_max_attempts, 10);
        assert_eq!(config.token_hour_data_limit, DEFAULT_TOKEN_HOUR_DATA_LIMIT);
    }

    #[rstest]
    fn test_from_toml_str_rejects_unknown_keys() {
        assert!(ExplorerConfig::from_toml_str("page_sise = 10").is_err());
    }

    #[rstest]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fetch_max_attempts = 3").unwrap();

        let config = ExplorerConfig::from_file(file.path()).unwrap();

        assert_eq!(config.fetch_max_attempts, 3);
    }

    #[rstest]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExplorerConfig::from_file(&dir.path().join("missing.toml"));
        assert!(result.is_err());
    }

    #[rstest]
    fn test_with_subgraph_url() {
        let config = ExplorerConfig::default().with_subgraph_url(None);
        assert_eq!(config.subgraph_url, DEFAULT_SUBGRAPH_URL);

        let config = config.with_subgraph_url(Some("http://localhost:8000".to_string()));
        assert_eq!(config.subgraph_url, "http://localhost:8000");
    }

    #[rstest]
    #[case("page_size = 0")]
    #[case("page_size = 1001")]
    #[case("fetch_max_attempts = 0")]
    #[case("subgraph_url = \"  \"")]
    #[case("token_hour_data_limit = 0")]
    fn test_validate_rejects(#[case] toml: &str) {
        let config = ExplorerConfig::from_toml_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[rstest]
    fn test_paged_query_config() {
        let config = ExplorerConfig::from_toml_str("fetch_max_attempts = 4").unwrap();

        let paged = config.paged_query_config();

        assert_eq!(paged.fetch_retry.max_retries, Some(3));
        assert_eq!(paged.batch_retry.max_retries, None);
    }

    #[rstest]
    fn test_default_paged_query_config_matches_query_default() {
        assert_eq!(
            ExplorerConfig::default().paged_query_config(),
            PagedQueryConfig::default()
        );
    }

    #[rstest]
    fn test_currency_load_config() {
        let config = ExplorerConfig::from_toml_str("page_size = 100\ntoken_hour_data_limit = 24")
            .unwrap();

        let load = config.currency_load_config();

        assert_eq!(load.page_size, 100);
        assert_eq!(load.token_hour_data_limit, 24);
    }
}
