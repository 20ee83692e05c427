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

//! The seam between query construction and the transport executing it.

use async_trait::async_trait;
use prism_network::http::GraphQlHttpClient;
use serde_json::Value;

use crate::{builder::QueryDocument, error::ExecutorError};

/// Executes GraphQL documents against a subgraph.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes `document` and returns the response `data` object.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries errors or no data.
    async fn execute(&self, document: &QueryDocument) -> Result<Value, ExecutorError>;
}

#[async_trait]
impl QueryExecutor for GraphQlHttpClient {
    async fn execute(&self, document: &QueryDocument) -> Result<Value, ExecutorError> {
        self.post(&document.query, &document.variables)
            .await
            .map_err(ExecutorError::from)
    }
}

/// Returns the entity array under `key` in a response `data` object.
///
/// # Errors
///
/// Returns [`ExecutorError::Decode`] if `key` is missing or not an array.
pub fn extract_entities(mut data: Value, key: &str) -> Result<Vec<Value>, ExecutorError> {
    match data.get_mut(key).map(Value::take) {
        Some(Value::Array(entities)) => Ok(entities),
        Some(other) => Err(ExecutorError::Decode(format!(
            "expected an array under '{key}', was {other}"
        ))),
        None => Err(ExecutorError::Decode(format!("missing '{key}' in response data"))),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn test_extract_entities() {
        let data = json!({"batch": [{"id": "0x1"}, {"id": "0x2"}]});
        let entities = extract_entities(data, "batch").unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1]["id"], "0x2");
    }

    #[rstest]
    #[case(json!({"tokens": []}), "batch")]
    #[case(json!({"batch": null}), "batch")]
    #[case(json!({"batch": {"id": "0x1"}}), "batch")]
    fn test_extract_entities_invalid(#[case] data: Value, #[case] key: &str) {
        assert!(matches!(
            extract_entities(data, key),
            Err(ExecutorError::Decode(_))
        ));
    }
}
