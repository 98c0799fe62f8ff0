//! Shared helpers: experiment names, duration parsing, field format checks

use std::time::Duration;

use uuid::Uuid;

use crate::error::{Error, Result};

/// Generate a unique experiment name: `{prefix}-{unix-timestamp}-{suffix}`
pub fn generate_unique_name(prefix: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, timestamp, &hex[..4])
}

/// Parse an experiment duration string (`30s`, `5m`, `2h`) into a [`Duration`]
pub fn parse_duration(value: &str) -> Result<Duration> {
    let (count, unit) = split_unit(value, &["s", "m", "h"]).ok_or_else(|| Error::Validation {
        field: "duration",
        reason: format!(
            "'{}' is not a valid duration; use format like '30s', '5m', '2h'",
            value
        ),
    })?;

    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        _ => 3600,
    };

    Ok(Duration::from_secs(count * multiplier))
}

/// Validate an experiment duration (`<positive integer><s|m|h>`)
pub fn validate_duration(value: &str, field: &'static str) -> Result<()> {
    match split_unit(value, &["s", "m", "h"]) {
        Some((count, _)) if count > 0 => Ok(()),
        _ => Err(Error::Validation {
            field,
            reason: format!(
                "'{}' is not a valid duration; use format like '30s', '5m', '2h'",
                value
            ),
        }),
    }
}

/// Validate a tc-style duration (`<integer><ns|us|ms|s|m>`), e.g. `100ms`
pub fn validate_tc_duration(value: &str, field: &'static str) -> Result<()> {
    // Longest suffixes first so "ms" is not consumed as "m" + trailing "s"
    match split_unit(value, &["ns", "us", "ms", "s", "m"]) {
        Some(_) => Ok(()),
        None => Err(Error::Validation {
            field,
            reason: format!(
                "'{}' has an invalid format; expected <number><unit> where unit is \
                 ns/us/ms/s/m, e.g. '100us', '5ms', '1s', '5m'",
                value
            ),
        }),
    }
}

/// Validate a percentage string (numeric, 0-100)
pub fn validate_percentage(value: &str, field: &'static str) -> Result<()> {
    match value.parse::<f64>() {
        Ok(pct) if (0.0..=100.0).contains(&pct) => Ok(()),
        _ => Err(Error::Validation {
            field,
            reason: format!("'{}' must be a number between 0 and 100", value),
        }),
    }
}

/// Split `12ms` into `(12, "ms")` for one of the accepted unit suffixes.
/// The numeric part must be all ASCII digits (no sign, no decimal point).
fn split_unit<'a>(value: &str, units: &[&'a str]) -> Option<(u64, &'a str)> {
    for unit in units {
        if let Some(digits) = value.strip_suffix(unit) {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return digits.parse::<u64>().ok().map(|n| (n, *unit));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_name_shape() {
        let name = generate_unique_name("podchaos");
        assert!(name.starts_with("podchaos-"));

        let parts: Vec<&str> = name.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 4);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert!(parse_duration("30").is_err());
        assert!(parse_duration("5mins").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn test_validate_duration_boundaries() {
        assert!(validate_duration("30s", "duration").is_ok());
        assert!(validate_duration("5m", "duration").is_ok());
        assert!(validate_duration("2h", "duration").is_ok());
        assert!(validate_duration("30", "duration").is_err());
        assert!(validate_duration("5mins", "duration").is_err());
        assert!(validate_duration("-1s", "duration").is_err());
        assert!(validate_duration("0s", "duration").is_err());
    }

    #[test]
    fn test_validate_tc_duration() {
        for ok in ["100us", "5ms", "1s", "5m", "250ns", "0ms"] {
            assert!(validate_tc_duration(ok, "latency").is_ok(), "{}", ok);
        }
        for bad in ["100", "1h", "ms", "1.5s", "-5ms"] {
            assert!(validate_tc_duration(bad, "latency").is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage("0", "correlation").is_ok());
        assert!(validate_percentage("50", "correlation").is_ok());
        assert!(validate_percentage("25.5", "correlation").is_ok());
        assert!(validate_percentage("100", "correlation").is_ok());
        assert!(validate_percentage("101", "correlation").is_err());
        assert!(validate_percentage("-1", "correlation").is_err());
        assert!(validate_percentage("abc", "correlation").is_err());
    }
}
