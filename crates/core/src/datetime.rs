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

//! Common data and time functions for UNIX second timestamps as used by subgraph entities.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Number of seconds in one minute.
pub const SECONDS_IN_MINUTE: i64 = 60;

/// Number of seconds in one hour.
pub const SECONDS_IN_HOUR: i64 = 3_600;

/// Number of seconds in one day.
pub const SECONDS_IN_DAY: i64 = 86_400;

/// Floors a UNIX seconds timestamp to the start of its hour.
///
/// Negative timestamps floor towards negative infinity.
#[must_use]
pub const fn floor_to_hour(unix_secs: i64) -> i64 {
    unix_secs.div_euclid(SECONDS_IN_HOUR) * SECONDS_IN_HOUR
}

/// Returns the current UNIX timestamp in seconds from the system clock.
#[must_use]
pub fn unix_timestamp_secs() -> i64 {
    Utc::now().timestamp()
}

/// Converts a UNIX seconds timestamp to an ISO 8601 (RFC 3339) format string.
///
/// Returns `None` if the timestamp is outside the range `chrono` can represent.
#[must_use]
pub fn unix_secs_to_iso8601(unix_secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(unix_secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Parses a timestamp string into UNIX seconds.
///
/// Accepts:
/// - An integer number of seconds: "1707577123"
/// - RFC 3339: "2024-02-10T14:58:43Z" (fractional seconds are truncated)
/// - A simple date: "2024-02-10" (interpreted as midnight UTC)
///
/// # Errors
///
/// Returns an error if the string matches none of the accepted formats.
pub fn parse_unix_secs(s: &str) -> anyhow::Result<i64> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<i64>() {
        return Ok(secs);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let dt = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("invalid date '{s}'"))?;
        return Ok(dt.and_utc().timestamp());
    }

    anyhow::bail!("failed to parse timestamp '{s}'")
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 0)]
    #[case(3_599, 0)]
    #[case(3_600, 3_600)]
    #[case(1_707_577_123, 1_707_573_600)]
    #[case(-1, -3_600)]
    fn test_floor_to_hour(#[case] secs: i64, #[case] expected: i64) {
        assert_eq!(floor_to_hour(secs), expected);
    }

    #[rstest]
    fn test_unix_timestamp_secs_is_after_2024() {
        assert!(unix_timestamp_secs() > 1_704_067_200);
    }

    #[rstest]
    #[case(0, "1970-01-01T00:00:00Z")]
    #[case(1_707_577_123, "2024-02-10T14:58:43Z")]
    fn test_unix_secs_to_iso8601(#[case] secs: i64, #[case] expected: &str) {
        assert_eq!(unix_secs_to_iso8601(secs).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("1707577123", 1_707_577_123)]
    #[case(" 42 ", 42)]
    #[case("2024-02-10T14:58:43Z", 1_707_577_123)]
    #[case("2024-02-10T14:58:43.999Z", 1_707_577_123)]
    #[case("2024-02-10T15:58:43+01:00", 1_707_577_123)]
    #[case("2024-02-10", 1_707_523_200)]
    fn test_parse_unix_secs(#[case] input: &str, #[case] expected: i64) {
        assert_eq!(parse_unix_secs(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2024-13-01")]
    #[case("12.5")]
    fn test_parse_unix_secs_invalid(#[case] input: &str) {
        assert!(parse_unix_secs(input).is_err());
    }
}
