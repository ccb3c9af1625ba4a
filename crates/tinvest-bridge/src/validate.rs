//! Argument normalization for tool calls.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tinvest_models::{CandleInterval, TimeRange};

use crate::error::ValidationError;

pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 50;

/// A string argument. Absent, `null` and non-string values are rejected.
pub fn required_str<'a>(args: &'a Value, name: &'static str) -> Result<&'a str, ValidationError> {
    match args.get(name) {
        None | Some(Value::Null) => Err(ValidationError::Missing(name)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ValidationError::WrongType {
            name,
            expected: "a string",
        }),
    }
}

/// A numeric argument. Numeric strings are accepted as well.
pub fn required_number(args: &Value, name: &'static str) -> Result<f64, ValidationError> {
    let wrong_type = ValidationError::WrongType {
        name,
        expected: "a number",
    };
    match args.get(name) {
        None | Some(Value::Null) => Err(ValidationError::Missing(name)),
        Some(Value::Number(n)) => n.as_f64().ok_or(wrong_type),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(wrong_type),
        Some(_) => Err(wrong_type),
    }
}

/// Lot count, truncated toward zero. Sign and magnitude are left to the backend.
pub fn lots(raw: f64) -> i64 {
    raw.trunc() as i64
}

/// Order book depth clamped to `[1, 50]`, fractional part dropped.
pub fn depth(raw: f64) -> u32 {
    if raw.is_nan() {
        return MIN_DEPTH;
    }
    raw.clamp(f64::from(MIN_DEPTH), f64::from(MAX_DEPTH)).trunc() as u32
}

fn timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            ValidationError::InvalidTimeRange(format!(
                "'{field}' is not an RFC3339 timestamp ({value:?}: {e}), e.g. 2024-01-01T00:00:00Z"
            ))
        })
}

/// Both endpoints must parse and `to` must be strictly after `from`.
pub fn time_range(from: &str, to: &str) -> Result<TimeRange, ValidationError> {
    let from = timestamp("from", from)?;
    let to = timestamp("to", to)?;
    TimeRange::new(from, to).ok_or_else(|| {
        ValidationError::InvalidTimeRange("'to' must be later than 'from'".to_string())
    })
}

/// Case-insensitive, whitespace-trimmed interval token lookup.
pub fn interval(token: &str) -> Result<CandleInterval, ValidationError> {
    match token.trim().to_lowercase().as_str() {
        "1m" | "1min" => Ok(CandleInterval::OneMinute),
        "5m" | "5min" => Ok(CandleInterval::FiveMinutes),
        "15m" | "15min" => Ok(CandleInterval::FifteenMinutes),
        "1h" | "60m" => Ok(CandleInterval::Hour),
        "1d" | "1day" | "day" | "d" => Ok(CandleInterval::Day),
        _ => Err(ValidationError::UnknownInterval(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn depth_is_clamped_and_truncated() {
        assert_eq!(depth(0.0), 1);
        assert_eq!(depth(-7.0), 1);
        assert_eq!(depth(1.0), 1);
        assert_eq!(depth(17.9), 17);
        assert_eq!(depth(50.0), 50);
        assert_eq!(depth(51.0), 50);
        assert_eq!(depth(1e9), 50);
        assert_eq!(depth(f64::NAN), 1);
    }

    #[test]
    fn lots_truncate_toward_zero_without_rejection() {
        assert_eq!(lots(3.9), 3);
        assert_eq!(lots(-2.7), -2);
        assert_eq!(lots(0.4), 0);
    }

    #[test]
    fn interval_tokens_case_insensitive() {
        assert_eq!(interval("1H").unwrap(), CandleInterval::Hour);
        assert_eq!(interval("1h").unwrap(), CandleInterval::Hour);
        assert_eq!(interval(" 60m ").unwrap(), CandleInterval::Hour);
        assert_eq!(interval("1min").unwrap(), CandleInterval::OneMinute);
        assert_eq!(interval("5MIN").unwrap(), CandleInterval::FiveMinutes);
        assert_eq!(interval("15m").unwrap(), CandleInterval::FifteenMinutes);
        for token in ["1d", "1day", "DAY", "d"] {
            assert_eq!(interval(token).unwrap(), CandleInterval::Day);
        }
    }

    #[test]
    fn unknown_interval_names_allowed_set() {
        let err = interval("1w").unwrap_err();
        assert_eq!(err, ValidationError::UnknownInterval("1w".to_string()));
        assert!(err.to_string().contains("1m, 5m, 15m, 1h, 1d"));
        assert!(interval("").is_err());
    }

    #[test]
    fn equal_endpoints_are_rejected() {
        let err = time_range("2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimeRange(_)));
    }

    #[test]
    fn one_second_window_is_valid() {
        let range = time_range("2024-01-01T00:00:00Z", "2024-01-01T00:00:01Z").unwrap();
        assert_eq!((range.to() - range.from()).num_seconds(), 1);
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let range = time_range("2024-01-01T03:00:00+03:00", "2024-01-01T01:00:00Z").unwrap();
        assert_eq!(range.from().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn unparsable_timestamp_is_invalid_range() {
        let err = time_range("yesterday", "2024-01-01T00:00:00Z").unwrap_err();
        match err {
            ValidationError::InvalidTimeRange(reason) => assert!(reason.contains("'from'")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(time_range("2024-01-01T00:00:00Z", "2024-13-01T00:00:00Z").is_err());
    }

    #[test]
    fn string_and_number_arguments() {
        let args = json!({"query": "SBER", "lots": 2.5, "depth": "10", "bad": true});
        assert_eq!(required_str(&args, "query").unwrap(), "SBER");
        assert_eq!(required_number(&args, "lots").unwrap(), 2.5);
        assert_eq!(required_number(&args, "depth").unwrap(), 10.0);
        assert_eq!(
            required_str(&args, "ticker"),
            Err(ValidationError::Missing("ticker"))
        );
        assert!(matches!(
            required_number(&args, "bad"),
            Err(ValidationError::WrongType { name: "bad", .. })
        ));
        assert!(matches!(
            required_str(&args, "lots"),
            Err(ValidationError::WrongType { name: "lots", .. })
        ));
        assert_eq!(
            required_str(&Value::Null, "query"),
            Err(ValidationError::Missing("query"))
        );
    }
}
