//! Clock-style timestamp conversion.
//!
//! Chunk metadata stores both raw seconds and formatted timestamps so that
//! downstream consumers (vector store metadata, summaries, exports) never
//! have to re-derive one from the other.

use crate::error::{Result, SkaldError};
use regex::Regex;
use std::sync::OnceLock;

static TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();

/// Format seconds as `HH:MM:SS.mmm`.
///
/// Negative input is clamped to zero. The millisecond component is rounded,
/// not truncated, so `timestamp_to_seconds(seconds_to_timestamp(x))` stays
/// within 1ms of `x`.
pub fn seconds_to_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let total_ms = (seconds * 1000.0).round() as u64;

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, ms)
}

/// Parse `HH:MM:SS`, `HH:MM:SS.mmm`, `MM:SS` or `MM:SS.mmm` into seconds.
///
/// The result is rounded to 3 decimal places.
pub fn timestamp_to_seconds(timestamp: &str) -> Result<f64> {
    let re = TIMESTAMP_RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+):)?([0-5]?\d):([0-5]?\d)(?:\.(\d{1,3}))?$")
            .expect("timestamp regex is valid")
    });

    let caps = re.captures(timestamp.trim()).ok_or_else(|| {
        SkaldError::InvalidInput(format!("Invalid timestamp format '{}'", timestamp))
    })?;

    let hours: f64 = caps
        .get(1)
        .map(|m| m.as_str().parse().unwrap_or(0.0))
        .unwrap_or(0.0);
    let minutes: f64 = caps[2].parse().unwrap_or(0.0);
    let secs: f64 = caps[3].parse().unwrap_or(0.0);
    let fraction: f64 = caps
        .get(4)
        .map(|m| format!("0.{}", m.as_str()).parse().unwrap_or(0.0))
        .unwrap_or(0.0);

    let total = hours * 3600.0 + minutes * 60.0 + secs + fraction;
    Ok((total * 1000.0).round() / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_timestamp() {
        assert_eq!(seconds_to_timestamp(0.0), "00:00:00.000");
        assert_eq!(seconds_to_timestamp(125.456), "00:02:05.456");
        assert_eq!(seconds_to_timestamp(3661.5), "01:01:01.500");
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(seconds_to_timestamp(-3.2), "00:00:00.000");
    }

    #[test]
    fn test_timestamp_to_seconds() {
        assert_eq!(timestamp_to_seconds("00:02:05.456").unwrap(), 125.456);
        assert_eq!(timestamp_to_seconds("01:01:01").unwrap(), 3661.0);
        assert_eq!(timestamp_to_seconds("02:05").unwrap(), 125.0);
        assert_eq!(timestamp_to_seconds("02:05.5").unwrap(), 125.5);
    }

    #[test]
    fn test_invalid_timestamp() {
        assert!(timestamp_to_seconds("not a timestamp").is_err());
        assert!(timestamp_to_seconds("1:2:3:4").is_err());
        assert!(timestamp_to_seconds("").is_err());
    }

    #[test]
    fn test_round_trip_within_1ms() {
        for x in [0.0, 0.001, 1.2345, 59.999, 61.5, 3599.875, 7261.33] {
            let restored = timestamp_to_seconds(&seconds_to_timestamp(x)).unwrap();
            assert!(
                (restored - x).abs() <= 0.001,
                "round trip drifted for {}: got {}",
                x,
                restored
            );
        }
    }
}
