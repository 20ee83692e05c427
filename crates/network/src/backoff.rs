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

//! An exponential backoff with jitter for spacing out query retries.
//!
//! The delay grows by a constant factor up to a configurable maximum, with optional random
//! jitter. With an initial delay of zero the backoff is disabled and every delay is zero, which
//! is how failed subgraph queries are retried unless configured otherwise.

use std::time::Duration;

use rand::RngExt;

/// An exponential backoff mechanism with optional jitter and immediate-first behavior.
///
/// Starts from an initial delay and multiplies it by a factor on each call to
/// [`ExponentialBackoff::next_duration`], capping the delay at a maximum. When
/// `immediate_first` is true the first call returns zero.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    /// The initial backoff delay.
    delay_initial: Duration,
    /// The maximum delay to cap the backoff.
    delay_max: Duration,
    /// The current backoff delay.
    delay_current: Duration,
    /// The factor to multiply the delay on each iteration.
    factor: f64,
    /// The maximum random jitter to add (in milliseconds).
    jitter_ms: u64,
    /// If true, the next call to `next_duration()` returns zero delay.
    immediate_first: bool,
    /// The configured immediate-first flag, restored on reset.
    immediate_reset: bool,
}

impl ExponentialBackoff {
    /// Creates a new [`ExponentialBackoff`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `factor` is not finite or is less than 1.0.
    /// - `delay_initial` exceeds `delay_max`.
    pub fn new(
        delay_initial: Duration,
        delay_max: Duration,
        factor: f64,
        jitter_ms: u64,
        immediate_first: bool,
    ) -> anyhow::Result<Self> {
        if !factor.is_finite() || factor < 1.0 {
            anyhow::bail!("invalid backoff `factor`, must be finite and >= 1.0, was {factor}");
        }
        if delay_initial > delay_max {
            anyhow::bail!(
                "invalid backoff delays, initial {delay_initial:?} exceeded max {delay_max:?}"
            );
        }

        Ok(Self {
            delay_initial,
            delay_max,
            delay_current: delay_initial,
            factor,
            jitter_ms,
            immediate_first,
            immediate_reset: immediate_first,
        })
    }

    /// Creates a disabled backoff which always returns a zero delay.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            delay_initial: Duration::ZERO,
            delay_max: Duration::ZERO,
            delay_current: Duration::ZERO,
            factor: 1.0,
            jitter_ms: 0,
            immediate_first: false,
            immediate_reset: false,
        }
    }

    /// Returns true if every delay produced by this backoff is zero.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.delay_max.is_zero() && self.jitter_ms == 0
    }

    /// Returns the next backoff delay with jitter and updates the internal state.
    pub fn next_duration(&mut self) -> Duration {
        if self.immediate_first {
            self.immediate_first = false;
            return Duration::ZERO;
        }

        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_ms)
        };
        let delay_with_jitter = self.delay_current + Duration::from_millis(jitter);

        // Prepare the next delay
        let current_nanos = self.delay_current.as_nanos() as f64;
        let max_nanos = self.delay_max.as_nanos() as f64;
        let next_nanos = (current_nanos * self.factor).min(max_nanos);
        self.delay_current = Duration::from_nanos(next_nanos as u64);

        delay_with_jitter
    }

    /// Resets the backoff to its initial state.
    pub const fn reset(&mut self) {
        self.delay_current = self.delay_initial;
        self.immediate_first = self.immediate_reset;
    }

    /// Returns the current base delay without jitter.
    #[must_use]
    pub const fn current_delay(&self) -> Duration {
        self.delay_current
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn backoff(initial_ms: u64, max_ms: u64, factor: f64) -> ExponentialBackoff {
        ExponentialBackoff::new(
            Duration::from_millis(initial_ms),
            Duration::from_millis(max_ms),
            factor,
            0,
            false,
        )
        .unwrap()
    }

    #[rstest]
    fn test_no_jitter_exponential_growth() {
        let mut backoff = backoff(100, 1600, 2.0);
        let delays: Vec<u128> = (0..6).map(|_| backoff.next_duration().as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1600, 1600]);
    }

    #[rstest]
    fn test_factor_less_than_two_is_capped() {
        let mut backoff = backoff(100, 200, 1.5);
        let delays: Vec<u128> = (0..4).map(|_| backoff.next_duration().as_millis()).collect();
        assert_eq!(delays, vec![100, 150, 200, 200]);
    }

    #[rstest]
    fn test_reset() {
        let mut backoff = backoff(100, 1600, 2.0);
        let _ = backoff.next_duration();
        let _ = backoff.next_duration();
        assert_eq!(backoff.current_delay(), Duration::from_millis(400));

        backoff.reset();
        assert_eq!(backoff.current_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_duration(), Duration::from_millis(100));
    }

    #[rstest]
    fn test_jitter_within_bounds() {
        for _ in 0..10 {
            let mut backoff = ExponentialBackoff::new(
                Duration::from_millis(100),
                Duration::from_millis(1000),
                2.0,
                50,
                false,
            )
            .unwrap();
            let delay = backoff.next_duration();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[rstest]
    fn test_immediate_first_restored_on_reset() {
        let mut backoff = ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_millis(1600),
            2.0,
            0,
            true,
        )
        .unwrap();

        assert_eq!(backoff.next_duration(), Duration::ZERO);
        assert_eq!(backoff.next_duration(), Duration::from_millis(100));
        assert_eq!(backoff.next_duration(), Duration::from_millis(200));

        backoff.reset();
        assert_eq!(backoff.next_duration(), Duration::ZERO);
    }

    #[rstest]
    fn test_disabled_always_zero() {
        let mut backoff = ExponentialBackoff::disabled();
        assert!(backoff.is_disabled());
        for _ in 0..5 {
            assert_eq!(backoff.next_duration(), Duration::ZERO);
        }
    }

    #[rstest]
    #[case(0.5, 100, 200)]
    #[case(f64::NAN, 100, 200)]
    #[case(f64::INFINITY, 100, 200)]
    #[case(2.0, 300, 200)]
    fn test_invalid_parameters(#[case] factor: f64, #[case] initial_ms: u64, #[case] max_ms: u64) {
        let result = ExponentialBackoff::new(
            Duration::from_millis(initial_ms),
            Duration::from_millis(max_ms),
            factor,
            0,
            false,
        );
        assert!(result.is_err());
    }
}
