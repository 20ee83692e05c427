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

//! Error types for query construction and execution.

use prism_network::{http::GraphQlHttpError, retry::CANCELED_MESSAGE};

/// Errors raised by a [`QueryExecutor`](crate::executor::QueryExecutor).
///
/// Every variant except [`ExecutorError::Canceled`] is treated as transient and retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    /// The request could not be sent or the response could not be read.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body.
        body: String,
    },
    /// The response carried GraphQL errors.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    /// The response carried no `data` object.
    #[error("Response missing data")]
    MissingData,
    /// The response `data` did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
    /// An attempt timed out.
    #[error("Timeout: {0}")]
    Timeout(String),
    /// The operation was canceled before it completed.
    #[error("Canceled")]
    Canceled,
    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl ExecutorError {
    /// Builds an error from a retry manager message.
    #[must_use]
    pub fn from_retry_message(message: String) -> Self {
        if message == CANCELED_MESSAGE {
            Self::Canceled
        } else if message.contains("timed out") {
            Self::Timeout(message)
        } else {
            Self::Other(message)
        }
    }

    /// Returns true if the operation may be attempted again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Canceled)
    }
}

impl From<GraphQlHttpError> for ExecutorError {
    fn from(error: GraphQlHttpError) -> Self {
        match error {
            GraphQlHttpError::Transport(message) => Self::Transport(message),
            GraphQlHttpError::UnexpectedStatus { status, body } => Self::Status {
                status: status.as_u16(),
                body,
            },
            GraphQlHttpError::GraphQl(messages) => Self::GraphQl(messages),
            GraphQlHttpError::MissingData => Self::MissingData,
            GraphQlHttpError::Json(message) => Self::Decode(message),
        }
    }
}

/// Errors raised by query construction and paged fetching.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The query is incomplete or invalid and cannot be built.
    #[error("Query configuration error: {0}")]
    Configuration(String),
    /// A raw filter value could not be parsed for its column.
    #[error("Invalid filter value '{value}' for field '{field}': {reason}")]
    InvalidFilterValue {
        /// The filtered field.
        field: String,
        /// The raw value.
        value: String,
        /// Why parsing failed.
        reason: String,
    },
    /// The executor failed after all retry attempts.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    /// A fetched entity could not be mapped into a row.
    #[error("Row mapping error: {0}")]
    Mapping(String),
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use prism_network::http::GraphQlHttpError;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(CANCELED_MESSAGE, ExecutorError::Canceled)]
    #[case(
        "Operation 'fetch' timed out after 10ms",
        ExecutorError::Timeout("Operation 'fetch' timed out after 10ms".to_string())
    )]
    #[case("Failed to create backoff", ExecutorError::Other("Failed to create backoff".to_string()))]
    fn test_from_retry_message(#[case] message: &str, #[case] expected: ExecutorError) {
        assert_eq!(ExecutorError::from_retry_message(message.to_string()), expected);
    }

    #[rstest]
    fn test_only_canceled_is_not_retryable() {
        assert!(!ExecutorError::Canceled.is_retryable());
        assert!(ExecutorError::MissingData.is_retryable());
        assert!(ExecutorError::Transport("reset".to_string()).is_retryable());
    }

    #[rstest]
    fn test_from_graphql_http_error() {
        let error = ExecutorError::from(GraphQlHttpError::GraphQl(vec!["bad field".to_string()]));
        assert_eq!(error, ExecutorError::GraphQl(vec!["bad field".to_string()]));
        assert_eq!(
            ExecutorError::from(GraphQlHttpError::Json("eof".to_string())),
            ExecutorError::Decode("eof".to_string())
        );
    }

    #[rstest]
    fn test_query_error_wraps_executor_error() {
        let error = QueryError::from(ExecutorError::MissingData);
        assert!(matches!(error, QueryError::Executor(ExecutorError::MissingData)));
        assert_eq!(error.to_string(), "Response missing data");
    }
}
