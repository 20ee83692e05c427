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

//! Generic retry mechanism for subgraph query operations.
//!
//! Retries may be bounded or unbounded. Cancellation is cooperative: it is observed between
//! attempts and interrupts backoff sleeps, but never preempts an attempt in flight.

use std::{future::Future, marker::PhantomData, time::Duration};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backoff::ExponentialBackoff;

/// The message passed to the error factory when an operation is canceled.
pub const CANCELED_MESSAGE: &str = "canceled";

/// Configuration for retry behavior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (total attempts = 1 initial + max_retries).
    /// If None, retries continue until success or cancellation.
    pub max_retries: Option<u32>,
    /// Initial delay between retries in milliseconds (0 disables backoff).
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff multiplier factor.
    pub backoff_factor: f64,
    /// Maximum jitter in milliseconds to add to delays.
    pub jitter_ms: u64,
    /// Optional timeout for individual operations in milliseconds.
    /// If None, no timeout is applied.
    pub operation_timeout_ms: Option<u64>,
    /// Whether the first retry should happen immediately without delay.
    pub immediate_first: bool,
}

impl Default for RetryConfig {
    /// Ten attempts in total, back to back, with no timeouts.
    fn default() -> Self {
        Self {
            max_retries: Some(9),
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_factor: 2.0,
            jitter_ms: 0,
            operation_timeout_ms: None,
            immediate_first: false,
        }
    }
}

impl RetryConfig {
    /// Returns this configuration with retries continuing until success or cancellation.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.max_retries = None;
        self
    }

    /// Returns this configuration limited to `attempts` attempts in total.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_retries = Some(attempts.saturating_sub(1));
        self
    }

    fn backoff(&self) -> anyhow::Result<ExponentialBackoff> {
        if self.initial_delay_ms == 0 && self.max_delay_ms == 0 && self.jitter_ms == 0 {
            return Ok(ExponentialBackoff::disabled());
        }
        ExponentialBackoff::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            self.backoff_factor,
            self.jitter_ms,
            self.immediate_first,
        )
    }
}

/// Generic retry manager for query operations.
///
/// This is stateless and thread-safe - each operation gets its own backoff state.
#[derive(Debug)]
pub struct RetryManager<E> {
    config: RetryConfig,
    _phantom: PhantomData<E>,
}

impl<E> RetryManager<E>
where
    E: std::error::Error,
{
    /// Creates a new retry manager with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backoff parameters of the configuration are invalid.
    pub fn new(config: RetryConfig) -> anyhow::Result<Self> {
        config.backoff()?;
        Ok(Self {
            config,
            _phantom: PhantomData,
        })
    }

    /// Returns the retry configuration.
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Executes an operation with retry logic.
    ///
    /// # Errors
    ///
    /// Returns the last error if the operation fails after exhausting all retries, a
    /// non-retryable error immediately, or an error built by `create_error` on timeout.
    pub async fn execute_with_retry<F, Fut, T>(
        &self,
        operation_name: &str,
        operation: F,
        should_retry: impl Fn(&E) -> bool,
        create_error: impl Fn(String) -> E,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_retry_with_cancel(
            operation_name,
            operation,
            should_retry,
            create_error,
            &CancellationToken::new(),
        )
        .await
    }

    /// Executes an operation with retry logic, observing `cancellation_token` between attempts.
    ///
    /// A canceled token stops further attempts and interrupts a backoff sleep, returning the
    /// error built by `create_error(CANCELED_MESSAGE)`. An attempt already in flight always
    /// settles first.
    ///
    /// # Errors
    ///
    /// Returns the last error if the operation fails after exhausting all retries, a
    /// non-retryable error immediately, or an error built by `create_error` on timeout or
    /// cancellation.
    pub async fn execute_with_retry_with_cancel<F, Fut, T>(
        &self,
        operation_name: &str,
        mut operation: F,
        should_retry: impl Fn(&E) -> bool,
        create_error: impl Fn(String) -> E,
        cancellation_token: &CancellationToken,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Create a fresh backoff state for this operation
        let mut backoff = self
            .config
            .backoff()
            .map_err(|e| create_error(format!("Failed to create backoff: {e}")))?;

        let mut attempt: u32 = 0;

        loop {
            if cancellation_token.is_cancelled() {
                debug!("Operation '{operation_name}' canceled before attempt {}", attempt + 1);
                return Err(create_error(CANCELED_MESSAGE.to_string()));
            }

            // Execute the operation with optional timeout
            let result = match self.config.operation_timeout_ms {
                Some(timeout_ms) => {
                    match tokio::time::timeout(Duration::from_millis(timeout_ms), operation()).await
                    {
                        Ok(result) => result,
                        Err(_elapsed) => Err(create_error(format!(
                            "Operation '{operation_name}' timed out after {timeout_ms}ms"
                        ))),
                    }
                }
                None => operation().await,
            };

            let error = match result {
                Ok(success) => {
                    if attempt > 0 {
                        debug!(
                            "Operation '{operation_name}' succeeded after {} attempts",
                            attempt + 1
                        );
                    }
                    return Ok(success);
                }
                Err(error) => error,
            };

            if !should_retry(&error) {
                debug!("Operation '{operation_name}' failed with non-retryable error: {error}");
                return Err(error);
            }

            if let Some(max_retries) = self.config.max_retries
                && attempt >= max_retries
            {
                warn!(
                    "Operation '{operation_name}' failed after {} attempts: {error}",
                    attempt + 1
                );
                return Err(error);
            }

            if cancellation_token.is_cancelled() {
                debug!("Operation '{operation_name}' canceled after attempt {}", attempt + 1);
                return Err(create_error(CANCELED_MESSAGE.to_string()));
            }

            let delay = backoff.next_duration();
            warn!(
                "Operation '{operation_name}' failed (attempt {}), retrying in {delay:?}: {error}",
                attempt + 1
            );

            if !delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = cancellation_token.cancelled() => {
                        debug!("Operation '{operation_name}' canceled during backoff");
                        return Err(create_error(CANCELED_MESSAGE.to_string()));
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }

            attempt = attempt.saturating_add(1);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use rstest::rstest;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("Retryable error: {0}")]
        Retryable(String),
        #[error("Non-retryable error: {0}")]
        NonRetryable(String),
        #[error("Timeout error: {0}")]
        Timeout(String),
        #[error("Canceled: {0}")]
        Canceled(String),
    }

    fn should_retry_test_error(error: &TestError) -> bool {
        matches!(error, TestError::Retryable(_))
    }

    fn create_test_error(msg: String) -> TestError {
        if msg == CANCELED_MESSAGE {
            TestError::Canceled(msg)
        } else {
            TestError::Timeout(msg)
        }
    }

    fn fast_config(max_retries: Option<u32>) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 10,
            max_delay_ms: 50,
            backoff_factor: 2.0,
            jitter_ms: 0,
            operation_timeout_ms: None,
            immediate_first: false,
        }
    }

    #[rstest]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, Some(9));
        assert_eq!(config.initial_delay_ms, 0);
        assert_eq!(config.operation_timeout_ms, None);
        assert!(!config.immediate_first);
    }

    #[rstest]
    fn test_retry_config_builders() {
        let config = RetryConfig::default().with_max_attempts(3);
        assert_eq!(config.max_retries, Some(2));
        assert_eq!(config.unbounded().max_retries, None);
    }

    #[rstest]
    fn test_retry_config_deserializes_partial_toml() {
        let config: RetryConfig = toml::from_str("initial_delay_ms = 100\nmax_delay_ms = 1000")
            .expect("Valid retry config");
        assert_eq!(config.initial_delay_ms, 100);
        assert_eq!(config.max_retries, Some(9));
    }

    #[rstest]
    fn test_invalid_config_is_rejected() {
        let config = RetryConfig {
            initial_delay_ms: 100,
            max_delay_ms: 10,
            ..Default::default()
        };
        assert!(RetryManager::<TestError>::new(config).is_err());
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let manager = RetryManager::new(RetryConfig::default()).unwrap();

        let result = manager
            .execute_with_retry(
                "test_operation",
                || async { Ok::<i32, TestError>(42) },
                should_retry_test_error,
                create_test_error,
            )
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_retryable_error() {
        let manager = RetryManager::new(RetryConfig::default()).unwrap();
        let attempts = Arc::new(AtomicU32::new(0));

        let result = manager
            .execute_with_retry(
                "test_operation",
                || {
                    let attempts = attempts.clone();
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Err::<i32, TestError>(TestError::NonRetryable("test".to_string()))
                    }
                },
                should_retry_test_error,
                create_test_error,
            )
            .await;

        assert!(matches!(result.unwrap_err(), TestError::NonRetryable(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retryable_error_exhausted_after_configured_attempts() {
        let manager = RetryManager::new(RetryConfig::default()).unwrap();
        let attempts = Arc::new(AtomicU32::new(0));

        let result = manager
            .execute_with_retry(
                "test_operation",
                || {
                    let attempts = attempts.clone();
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Err::<i32, TestError>(TestError::Retryable("test".to_string()))
                    }
                },
                should_retry_test_error,
                create_test_error,
            )
            .await;

        assert!(matches!(result.unwrap_err(), TestError::Retryable(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_unbounded_retries_until_success() {
        let manager = RetryManager::new(RetryConfig::default().unbounded()).unwrap();
        let attempts = Arc::new(AtomicU32::new(0));

        let result = manager
            .execute_with_retry(
                "test_operation",
                || {
                    let attempts = attempts.clone();
                    async move {
                        let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                        if n < 25 {
                            Err(TestError::Retryable(format!("attempt {n}")))
                        } else {
                            Ok(n)
                        }
                    }
                },
                should_retry_test_error,
                create_test_error,
            )
            .await;

        assert_eq!(result.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_timeout_path() {
        let config = RetryConfig {
            operation_timeout_ms: Some(20),
            ..fast_config(Some(1))
        };
        let manager = RetryManager::new(config).unwrap();

        let result = manager
            .execute_with_retry(
                "test_timeout",
                || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok::<i32, TestError>(42)
                },
                should_retry_test_error,
                create_test_error,
            )
            .await;

        // Timeouts are not retryable for this predicate
        assert!(matches!(result.unwrap_err(), TestError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_cancel_before_first_attempt() {
        let manager = RetryManager::new(RetryConfig::default()).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let result = manager
            .execute_with_retry_with_cancel(
                "test_cancel",
                || async { Ok::<i32, TestError>(1) },
                should_retry_test_error,
                create_test_error,
                &token,
            )
            .await;

        assert!(matches!(result.unwrap_err(), TestError::Canceled(_)));
    }

    #[tokio::test]
    async fn test_cancel_stops_unbounded_retries() {
        let manager = RetryManager::new(fast_config(None)).unwrap();
        let token = CancellationToken::new();
        let attempts = Arc::new(AtomicU32::new(0));

        let result = manager
            .execute_with_retry_with_cancel(
                "test_cancel",
                || {
                    let attempts = attempts.clone();
                    let token = token.clone();
                    async move {
                        if attempts.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                            token.cancel();
                        }
                        Err::<i32, TestError>(TestError::Retryable("test".to_string()))
                    }
                },
                should_retry_test_error,
                create_test_error,
                &token,
            )
            .await;

        assert!(matches!(result.unwrap_err(), TestError::Canceled(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_backoff_sleep() {
        let config = RetryConfig {
            initial_delay_ms: 60_000,
            max_delay_ms: 60_000,
            ..fast_config(None)
        };
        let manager = RetryManager::new(config).unwrap();
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let start = tokio::time::Instant::now();
        let result = manager
            .execute_with_retry_with_cancel(
                "test_cancel_sleep",
                || async { Err::<i32, TestError>(TestError::Retryable("test".to_string())) },
                should_retry_test_error,
                create_test_error,
                &token,
            )
            .await;

        assert!(matches!(result.unwrap_err(), TestError::Canceled(_)));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_in_flight_attempt_settles_before_cancellation() {
        let manager = RetryManager::new(RetryConfig::default()).unwrap();
        let token = CancellationToken::new();

        let result = manager
            .execute_with_retry_with_cancel(
                "test_settle",
                || {
                    let token = token.clone();
                    async move {
                        token.cancel();
                        Ok::<i32, TestError>(7)
                    }
                },
                should_retry_test_error,
                create_test_error,
                &token,
            )
            .await;

        // The attempt completed, so its result is returned to the caller
        assert_eq!(result.unwrap(), 7);
    }
}
