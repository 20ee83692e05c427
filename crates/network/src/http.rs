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

//! A GraphQL-over-HTTP client for subgraph endpoints.

use std::time::Duration;

use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// The default request timeout for subgraph queries in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Errors returned by [`GraphQlHttpClient`].
#[derive(Debug, thiserror::Error)]
pub enum GraphQlHttpError {
    /// The request could not be sent or the response body could not be read.
    #[error("HTTP transport error: {0}")]
    Transport(String),
    /// The endpoint answered with a non-success HTTP status.
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// The response carried a GraphQL `errors` array.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    /// The response carried neither errors nor a `data` object.
    #[error("GraphQL response missing `data`")]
    MissingData,
    /// The response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<reqwest::Error> for GraphQlHttpError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for GraphQlHttpError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorMessage>>,
}

#[derive(Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

/// A GraphQL-over-HTTP client for a single subgraph endpoint.
///
/// Queries are sent as `POST` requests with a JSON body of `{query, variables}`.
#[derive(Clone, Debug)]
pub struct GraphQlHttpClient {
    url: Url,
    client: reqwest::Client,
}

impl GraphQlHttpClient {
    /// Creates a new [`GraphQlHttpClient`] for the endpoint at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid `http` or `https` URL, or if the underlying
    /// HTTP client cannot be built.
    pub fn new(url: &str, timeout_secs: Option<u64>) -> anyhow::Result<Self> {
        let url = Url::parse(url).map_err(|e| anyhow::anyhow!("invalid subgraph URL '{url}': {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("invalid subgraph URL scheme '{}', expected http or https", url.scheme());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)))
            .build()?;

        Ok(Self { url, client })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Posts a GraphQL `query` with `variables` and returns the response `data` object.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request fails in transport.
    /// - The endpoint answers with a non-success status.
    /// - The response contains GraphQL errors or no `data`.
    pub async fn post(&self, query: &str, variables: &Value) -> Result<Value, GraphQlHttpError> {
        let body = GraphQlRequest { query, variables };

        tracing::trace!("POST {} query={query}", self.url);
        let response = self
            .client
            .post(self.url.clone())
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!("HTTP error {status} with body: {text}");
            return Err(GraphQlHttpError::UnexpectedStatus { status, body: text });
        }

        let parsed: GraphQlResponse = serde_json::from_str(&text)?;

        if let Some(errors) = parsed.errors
            && !errors.is_empty()
        {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            tracing::debug!("GraphQL errors: {messages:?}");
            return Err(GraphQlHttpError::GraphQl(messages));
        }

        match parsed.data {
            Some(data) if !data.is_null() => Ok(data),
            _ => Err(GraphQlHttpError::MissingData),
        }
    }
}
