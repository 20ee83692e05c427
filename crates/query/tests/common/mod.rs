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

//! Scripted executors for exercising the fetch protocol.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use prism_query::{
    builder::QueryDocument,
    column::ColumnDescriptor,
    descriptor::EntityDescriptor,
    enums::ColumnDataType,
    error::ExecutorError,
    executor::QueryExecutor,
};
use serde_json::{Value, json};
use tokio::sync::Notify;

/// One scripted executor response.
#[derive(Debug)]
pub enum Step {
    /// Respond with the given `data` object.
    Respond(Value),
    /// Fail with the given error.
    Fail(ExecutorError),
    /// Signal `started`, wait for `release`, then respond with `data`.
    Gated {
        started: Arc<Notify>,
        release: Arc<Notify>,
        data: Value,
    },
}

/// An executor replaying a script of steps, recording every document it receives.
///
/// Once the script is exhausted it fails with the fallback error if one is set, and otherwise
/// responds with empty collections.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    steps: Mutex<VecDeque<Step>>,
    fallback: Option<ExecutorError>,
    documents: Mutex<Vec<QueryDocument>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Self::default()
        }
    }

    pub fn failing(error: ExecutorError) -> Self {
        Self {
            fallback: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn documents(&self) -> Vec<QueryDocument> {
        self.documents.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, document: &QueryDocument) -> Result<Value, ExecutorError> {
        self.documents.lock().unwrap().push(document.clone());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let step = self.steps.lock().unwrap().pop_front();
        tokio::task::yield_now().await;

        let result = match step {
            Some(Step::Respond(data)) => Ok(data),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Gated {
                started,
                release,
                data,
            }) => {
                started.notify_one();
                release.notified().await;
                Ok(data)
            }
            None => match &self.fallback {
                Some(error) => Err(error.clone()),
                None => Ok(json!({ "batch": [], "tokens": [], "bundle": null })),
            },
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Returns a minimal token descriptor with id and symbol columns.
pub fn token_descriptor() -> EntityDescriptor {
    EntityDescriptor::from_columns(
        "tokens",
        vec![
            ColumnDescriptor::new("id", "Address", ColumnDataType::Id),
            ColumnDescriptor::new("symbol", "Symbol", ColumnDataType::Text),
        ],
    )
    .unwrap()
}

/// Returns token entities for the given ids, with symbols derived from the ids.
pub fn tokens(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({ "id": id, "symbol": format!("T{}", id.trim_start_matches("0x")) }))
            .collect(),
    )
}

/// Returns a single-page response `data` object.
pub fn page(ids: &[&str]) -> Value {
    json!({ "tokens": tokens(ids) })
}

/// Returns a batch response `data` object.
pub fn batch(ids: &[&str]) -> Value {
    json!({ "batch": tokens(ids) })
}

pub fn transport_error() -> ExecutorError {
    ExecutorError::Transport("connection reset".to_string())
}
