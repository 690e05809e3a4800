//! Time-related utilities with clock abstraction for testability.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use thiserror::Error;

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Get current Unix timestamp (milliseconds, UTC)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to RFC 3339 format in UTC.
///
/// Out-of-range timestamps fall back to the Unix epoch.
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_millis)
        .single()
        .unwrap_or_default()
        .to_rfc3339()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("duration is empty")]
    Empty,

    #[error("invalid duration number in '{0}'")]
    InvalidNumber(String),

    #[error("unknown duration unit '{unit}' in '{input}' (expected ms, s, m or h)")]
    UnknownUnit { input: String, unit: String },

    #[error("duration '{0}' is too large")]
    Overflow(String),
}

/// Parse a human-written duration such as `500ms`, `10s`, `1m` or `2h`.
///
/// A bare number is read as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let split_at = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split_at);
    let value: u64 = number
        .parse()
        .map_err(|_| DurationParseError::InvalidNumber(trimmed.to_string()))?;

    let seconds = |multiplier: u64| {
        value
            .checked_mul(multiplier)
            .map(Duration::from_secs)
            .ok_or_else(|| DurationParseError::Overflow(trimmed.to_string()))
    };

    match unit.trim() {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => seconds(1),
        "m" => seconds(60),
        "h" => seconds(60 * 60),
        other => Err(DurationParseError::UnknownUnit {
            input: trimmed.to_string(),
            unit: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_non_zero_timestamp() {
        // テスト項目: SystemClock が 0 以外のタイムスタンプを返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let timestamp = clock.now_millis();

        // then (期待する結果):
        assert!(timestamp > 0);
    }

    #[test]
    fn test_fixed_clock_returns_consistent_timestamp() {
        // テスト項目: FixedClock が複数回呼び出しても同じタイムスタンプを返す
        // given (前提条件):
        let fixed_time = 9876543210987;
        let clock = FixedClock::new(fixed_time);

        // when (操作):
        let timestamp1 = clock.now_millis();
        let timestamp2 = clock.now_millis();

        // then (期待する結果):
        assert_eq!(timestamp1, fixed_time);
        assert_eq!(timestamp2, fixed_time);
    }

    #[test]
    fn test_timestamp_to_rfc3339_format() {
        // テスト項目: タイムスタンプが UTC の RFC 3339 形式に変換される
        // given (前提条件):
        // 2023-01-01 00:00:00.123 UTC in milliseconds
        let timestamp = 1672531200123;

        // when (操作):
        let result = timestamp_to_rfc3339(timestamp);

        // then (期待する結果):
        assert!(result.starts_with("2023-01-01T00:00:00.123"));
        assert!(result.ends_with("+00:00"));
    }

    #[test]
    fn test_parse_duration_units() {
        // テスト項目: 各単位の文字列が Duration に変換される
        // given (前提条件):
        let cases = [
            ("500ms", Duration::from_millis(500)),
            ("10s", Duration::from_secs(10)),
            ("1m", Duration::from_secs(60)),
            ("2h", Duration::from_secs(7200)),
            ("15", Duration::from_secs(15)),
        ];

        for (input, expected) in cases {
            // when (操作):
            let result = parse_duration(input);

            // then (期待する結果):
            assert_eq!(result, Ok(expected), "input: {input}");
        }
    }

    #[test]
    fn test_parse_duration_rejects_invalid_input() {
        // テスト項目: 不正な文字列はエラーになる
        // given (前提条件):

        // when (操作):
        let empty = parse_duration("  ");
        let no_number = parse_duration("ms");
        let bad_unit = parse_duration("3d");

        // then (期待する結果):
        assert_eq!(empty, Err(DurationParseError::Empty));
        assert!(matches!(no_number, Err(DurationParseError::InvalidNumber(_))));
        assert!(matches!(
            bad_unit,
            Err(DurationParseError::UnknownUnit { ref unit, .. }) if unit == "d"
        ));
    }

    #[test]
    fn test_parse_duration_rejects_overflowing_minutes_and_hours() {
        // テスト項目: 秒に換算すると u64 を超える分・時間の指定は Overflow エラーになる
        // given (前提条件):
        let minutes = "307445734561825861m";
        let hours = "5124095576030432h";

        // when (操作):
        let minutes_result = parse_duration(minutes);
        let hours_result = parse_duration(hours);
        let largest_seconds = parse_duration("18446744073709551615s");

        // then (期待する結果):
        assert_eq!(
            minutes_result,
            Err(DurationParseError::Overflow(minutes.to_string()))
        );
        assert_eq!(hours_result, Err(DurationParseError::Overflow(hours.to_string())));
        assert_eq!(largest_seconds, Ok(Duration::from_secs(u64::MAX)));
    }
}
