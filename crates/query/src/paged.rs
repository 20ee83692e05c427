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

//! Paged and exhaustive fetching of one entity collection.
//!
//! A [`PagedQuery`] serializes its fetches: at most one page or batch loop runs per instance, and
//! later calls wait for the running one to settle. Cancellation is cooperative and generation
//! based. [`PagedQuery::cancel`] cancels the current generation, installs a fresh one, and waits
//! for the in-flight fetch to settle; a fetch observing its canceled generation returns an empty
//! (or, for batch loops, partial) result instead of an error.

use std::{
    fmt::Debug,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use log::{debug, info};
use prism_network::retry::{RetryConfig, RetryManager};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{
    builder::{BATCH_ALIAS, MAX_PAGE_SIZE, QueryBuilder, QueryDocument},
    column::{ColumnDescriptor, parse_filter_value},
    descriptor::EntityDescriptor,
    enums::{FilterOperator, OrderDirection},
    error::{ExecutorError, QueryError},
    executor::{QueryExecutor, extract_entities},
    row::Row,
};

/// Retry configuration for a [`PagedQuery`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagedQueryConfig {
    /// Retries for single-page fetches, ten attempts in total by default.
    pub fetch_retry: RetryConfig,
    /// Retries for each batch of an exhaustive fetch, unbounded by default.
    pub batch_retry: RetryConfig,
}

impl Default for PagedQueryConfig {
    fn default() -> Self {
        Self {
            fetch_retry: RetryConfig::default(),
            batch_retry: RetryConfig::default().unbounded(),
        }
    }
}

/// The rows of a fetch together with the columns describing them.
#[derive(Clone, Debug)]
pub struct FetchResult {
    /// The mapped rows in response order.
    pub rows: Vec<Row>,
    /// The columns of the rows; empty for a canceled fetch.
    pub columns: Arc<[ColumnDescriptor]>,
}

impl FetchResult {
    /// Returns a result with no rows and no columns.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            columns: Arc::from(Vec::new()),
        }
    }

    /// Returns true if the result has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// A query over one entity collection supporting page fetches and exhaustive batch fetches.
///
/// Mutations take `&mut self` and so cannot overlap a running fetch.
pub struct PagedQuery {
    descriptor: EntityDescriptor,
    builder: QueryBuilder,
    executor: Arc<dyn QueryExecutor>,
    fetch_retry: RetryManager<ExecutorError>,
    batch_retry: RetryManager<ExecutorError>,
    fetch_lock: tokio::sync::Mutex<()>,
    generation: Mutex<CancellationToken>,
}

impl Debug for PagedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(PagedQuery))
            .field("entity_name", &self.descriptor.entity_name)
            .field("builder", &self.builder)
            .field("is_fetching", &self.is_fetching())
            .finish_non_exhaustive()
    }
}

impl PagedQuery {
    /// Creates a new [`PagedQuery`] instance with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns an error if either retry configuration is invalid.
    pub fn new_checked(
        descriptor: EntityDescriptor,
        executor: Arc<dyn QueryExecutor>,
        config: PagedQueryConfig,
    ) -> anyhow::Result<Self> {
        let fetch_retry = RetryManager::new(config.fetch_retry)?;
        let batch_retry = RetryManager::new(config.batch_retry)?;
        let builder = descriptor.builder();

        let mut query = Self {
            descriptor,
            builder,
            executor,
            fetch_retry,
            batch_retry,
            fetch_lock: tokio::sync::Mutex::new(()),
            generation: Mutex::new(CancellationToken::new()),
        };
        query.reset();
        Ok(query)
    }

    /// Creates a new [`PagedQuery`] instance with the default retry configuration.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails. See [`PagedQuery::new_checked`] for more details.
    #[must_use]
    pub fn new(descriptor: EntityDescriptor, executor: Arc<dyn QueryExecutor>) -> Self {
        Self::new_checked(descriptor, executor, PagedQueryConfig::default())
            .expect(prism_core::correctness::FAILED)
    }

    /// Returns the entity descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// Returns the query builder state.
    #[must_use]
    pub const fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Returns true if a fetch currently holds the fetch lock.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.fetch_lock.try_lock().is_err()
    }

    /// Fetches the current page.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be built, every attempt fails, or an entity cannot
    /// be mapped.
    pub async fn fetch(&self) -> Result<FetchResult, QueryError> {
        self.fetch_with_cancel(&CancellationToken::new()).await
    }

    /// Fetches the current page, additionally observing `cancellation_token`.
    ///
    /// Returns an empty result if cancellation is observed once an attempt settles.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be built, every attempt fails, or an entity cannot
    /// be mapped.
    pub async fn fetch_with_cancel(
        &self,
        cancellation_token: &CancellationToken,
    ) -> Result<FetchResult, QueryError> {
        let generation = self.current_generation();
        let _guard = self.fetch_lock.lock().await;

        let document = self.builder.build()?;
        let entity_name = self.descriptor.entity_name;

        let (result, canceled) = run_linked(&generation, cancellation_token, |token| {
            self.fetch_page(&document, token, cancellation_token)
        })
        .await;

        if canceled {
            debug!("Fetch of {entity_name} canceled, discarding result");
            return Ok(FetchResult::empty());
        }

        let entities = result?;
        debug!("Fetched {} {entity_name}", entities.len());
        Ok(FetchResult {
            rows: self.map_rows(&entities)?,
            columns: self.descriptor.columns.clone(),
        })
    }

    /// Fetches every entity matching the filters, batch by batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be built, the batch retry budget is exhausted, or an
    /// entity cannot be mapped.
    pub async fn fetch_all(&self) -> Result<FetchResult, QueryError> {
        self.fetch_all_with_cancel(&CancellationToken::new()).await
    }

    /// Fetches every entity matching the filters, additionally observing `cancellation_token`.
    ///
    /// On cancellation the rows of the batches completed so far are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be built, the batch retry budget is exhausted, or an
    /// entity cannot be mapped.
    pub async fn fetch_all_with_cancel(
        &self,
        cancellation_token: &CancellationToken,
    ) -> Result<FetchResult, QueryError> {
        let mut rows = Vec::new();
        self.fetch_batches(cancellation_token, |entities| {
            rows.extend(self.map_rows(&entities)?);
            Ok(())
        })
        .await?;

        Ok(FetchResult {
            rows,
            columns: self.descriptor.columns.clone(),
        })
    }

    /// Fetches every entity matching the filters without mapping them into rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be built or the batch retry budget is exhausted.
    pub async fn fetch_all_raw(
        &self,
        cancellation_token: &CancellationToken,
    ) -> Result<Vec<Value>, QueryError> {
        let mut all = Vec::new();
        self.fetch_batches(cancellation_token, |entities| {
            all.extend(entities);
            Ok(())
        })
        .await?;
        Ok(all)
    }

    /// Cancels the in-flight fetch, if any, and waits for it to settle.
    pub async fn cancel(&self) {
        if !self.is_fetching() {
            return;
        }

        let canceled = {
            let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *generation, CancellationToken::new())
        };
        canceled.cancel();
        debug!("Canceling fetch of {}", self.descriptor.entity_name);

        let _settled = self.fetch_lock.lock().await;
    }

    /// Adds a filter on `field`, parsing `raw_value` with the column's parser.
    ///
    /// Fields without a column or parser fall back to string quoting.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidFilterValue`] if the value cannot be parsed.
    pub fn add_filter(
        &mut self,
        field: &str,
        operator: FilterOperator,
        raw_value: &str,
    ) -> Result<&mut Self, QueryError> {
        let parser = self.descriptor.column(field).and_then(|column| column.parser);
        let value = parse_filter_value(parser, operator, raw_value).map_err(|e| {
            QueryError::InvalidFilterValue {
                field: field.to_string(),
                value: raw_value.to_string(),
                reason: e.to_string(),
            }
        })?;

        self.builder.add_filter(field, operator, value);
        Ok(self)
    }

    /// Removes the filter on `field`, if any.
    pub fn remove_filter(&mut self, field: &str) -> &mut Self {
        self.builder.remove_filter(field);
        self
    }

    /// Removes all filters.
    pub fn clear_filters(&mut self) -> &mut Self {
        self.builder.clear_filters();
        self
    }

    /// Sets the zero-based page index.
    pub fn set_page(&mut self, page: usize) -> &mut Self {
        self.builder.set_page(page);
        self
    }

    /// Sets the page size, capped at [`MAX_PAGE_SIZE`] when rendered.
    pub fn set_page_size(&mut self, page_size: usize) -> &mut Self {
        self.builder.set_page_size(page_size);
        self
    }

    /// Sets the order-by field, which also becomes the batch cursor.
    ///
    /// The cursor type follows the data type of the field's column when there is one.
    pub fn set_order_by(&mut self, field: &str) -> &mut Self {
        self.builder.set_order_by(field);
        if let Some(column) = self.descriptor.column(field) {
            self.builder
                .set_cursor_type(column.data_type.graphql_type());
        }
        self
    }

    /// Sets the sort direction.
    pub fn set_order_direction(&mut self, direction: OrderDirection) -> &mut Self {
        self.builder.set_order_direction(direction);
        self
    }

    /// Restores the builder from the descriptor with a page size of [`MAX_PAGE_SIZE`].
    pub fn reset(&mut self) -> &mut Self {
        self.builder = self.descriptor.builder();
        self.builder.set_page_size(MAX_PAGE_SIZE);
        self
    }

    fn current_generation(&self) -> CancellationToken {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn map_rows(&self, entities: &[Value]) -> Result<Vec<Row>, QueryError> {
        entities
            .iter()
            .map(|entity| {
                self.descriptor
                    .map_entity(entity)
                    .map_err(|e| QueryError::Mapping(e.to_string()))
            })
            .collect()
    }

    async fn fetch_page(
        &self,
        document: &QueryDocument,
        token: CancellationToken,
        caller: &CancellationToken,
    ) -> (Result<Vec<Value>, ExecutorError>, bool) {
        let executor = &self.executor;
        let entity_name = self.descriptor.entity_name;

        let result = self
            .fetch_retry
            .execute_with_retry_with_cancel(
                "fetch",
                move || async move {
                    let data = executor.execute(document).await?;
                    extract_entities(data, &entity_name)
                },
                ExecutorError::is_retryable,
                ExecutorError::from_retry_message,
                &token,
            )
            .await;

        (result, token.is_cancelled() || caller.is_cancelled())
    }

    async fn fetch_batches<F>(
        &self,
        cancellation_token: &CancellationToken,
        on_batch: F,
    ) -> Result<(), QueryError>
    where
        F: FnMut(Vec<Value>) -> Result<(), QueryError>,
    {
        let generation = self.current_generation();
        let _guard = self.fetch_lock.lock().await;

        run_linked(&generation, cancellation_token, move |token| {
            self.batch_loop(token, cancellation_token, on_batch)
        })
        .await
    }

    async fn batch_loop<F>(
        &self,
        token: CancellationToken,
        caller: &CancellationToken,
        mut on_batch: F,
    ) -> Result<(), QueryError>
    where
        F: FnMut(Vec<Value>) -> Result<(), QueryError>,
    {
        let executor = &self.executor;
        let entity_name = self.descriptor.entity_name;
        let cursor_field = self.builder.cursor_field();

        let mut cursor: Option<Value> = None;
        let mut batches: usize = 0;
        let mut total: usize = 0;

        loop {
            if token.is_cancelled() || caller.is_cancelled() {
                info!("Batch fetch of {entity_name} canceled after {batches} batches");
                return Ok(());
            }

            let document = self.builder.build_batch_query(cursor.as_ref())?;
            let document = &document;
            let result = self
                .batch_retry
                .execute_with_retry_with_cancel(
                    "fetch_all batch",
                    move || async move {
                        let data = executor.execute(document).await?;
                        extract_entities(data, BATCH_ALIAS)
                    },
                    ExecutorError::is_retryable,
                    ExecutorError::from_retry_message,
                    &token,
                )
                .await;

            if token.is_cancelled() || caller.is_cancelled() {
                info!(
                    "Batch fetch of {entity_name} canceled after {batches} batches, discarding settled batch"
                );
                return Ok(());
            }

            let entities = result?;
            let Some(last) = entities.last() else {
                debug!("Fetched {total} {entity_name} in {batches} batches");
                return Ok(());
            };

            let next_cursor = last
                .get(cursor_field.as_str())
                .filter(|value| !value.is_null())
                .cloned()
                .ok_or_else(|| {
                    QueryError::Configuration(format!(
                        "cursor field '{cursor_field}' missing from {entity_name} batch entity"
                    ))
                })?;

            cursor = Some(next_cursor);
            batches += 1;
            total += entities.len();
            on_batch(entities)?;
        }
    }
}

/// Runs `work` with a child token of `generation` which is also canceled once `caller` is.
///
/// Generation cancellation reaches the child token synchronously. Caller cancellation is
/// propagated by a linking future polled alongside `work`, so `work` must also check `caller`
/// directly where the ordering matters.
async fn run_linked<F, Fut, T>(
    generation: &CancellationToken,
    caller: &CancellationToken,
    work: F,
) -> T
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = T>,
{
    let linked = generation.child_token();
    if caller.is_cancelled() {
        linked.cancel();
    }
    let done = CancellationToken::new();

    let link = async {
        tokio::select! {
            () = caller.cancelled() => linked.cancel(),
            () = done.cancelled() => {}
        }
    };
    let run = async {
        let output = work(linked.clone()).await;
        done.cancel();
        output
    };

    let ((), output) = tokio::join!(link, run);
    output
}
