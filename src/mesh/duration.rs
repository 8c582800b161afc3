//! Serde support for durations in protobuf-JSON string form (`"10s"`, `"0.5s"`).
//!
//! Millisecond (`"500ms"`), minute (`"2m"`) and hour (`"1h"`) suffixes are
//! accepted on input; output always uses seconds.

use serde::{Deserialize, Deserializer, Serializer, de};
use std::time::Duration;

pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(duration))
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_duration(&text).map_err(de::Error::custom)
}

pub(crate) fn format_duration(duration: &Duration) -> String {
    let nanos = duration.subsec_nanos();
    if nanos == 0 {
        return format!("{}s", duration.as_secs());
    }
    let fraction = format!("{:09}", nanos);
    format!("{}.{}s", duration.as_secs(), fraction.trim_end_matches('0'))
}

/// Parse a duration with a unit suffix. Decimal fractions are exact down to
/// the nanosecond.
pub(crate) fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    let (number, unit_nanos): (&str, u128) = if let Some(n) = text.strip_suffix("ms") {
        (n, 1_000_000)
    } else if let Some(n) = text.strip_suffix('s') {
        (n, 1_000_000_000)
    } else if let Some(n) = text.strip_suffix('m') {
        (n, 60_000_000_000)
    } else if let Some(n) = text.strip_suffix('h') {
        (n, 3_600_000_000_000)
    } else {
        return Err(format!("invalid duration '{}': missing unit (ms, s, m, h)", text));
    };

    let invalid = || format!("invalid duration '{}'", text);
    let (whole, fraction) = number.trim().split_once('.').unwrap_or((number.trim(), ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    // Sub-nanosecond remainders are truncated
    let fraction = &fraction[..fraction.len().min(18)];
    let fraction_nanos = if fraction.is_empty() {
        0
    } else {
        let digits: u128 = fraction.parse().map_err(|_| invalid())?;
        digits * unit_nanos / 10u128.pow(fraction.len() as u32)
    };

    whole
        .checked_mul(unit_nanos)
        .and_then(|n| n.checked_add(fraction_nanos))
        .and_then(|n| u64::try_from(n).ok())
        .map(Duration::from_nanos)
        .ok_or_else(|| format!("invalid duration '{}': out of range", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("0.5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("abcs").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_duration(&Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(&Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(&Duration::from_millis(7)), "0.007s");
    }

    #[test]
    fn test_sub_second_values_survive_formatting() {
        for millis in [1, 7, 333, 1001, 59_999] {
            let duration = Duration::from_millis(millis);
            assert_eq!(parse_duration(&format_duration(&duration)).unwrap(), duration);
        }
        assert_eq!(parse_duration(".25s").unwrap(), Duration::from_millis(250));
        assert!(parse_duration(".s").is_err());
        assert!(parse_duration("1.2.3s").is_err());
    }
}
