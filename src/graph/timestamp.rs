//! Timestamps accepted in any of the encodings ingestion sources emit
//!
//! Incoming values may be ISO-8601 strings, Unix seconds, or Unix
//! milliseconds. All of them normalize to a UTC instant.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Numeric values at or above this magnitude are milliseconds
const MILLIS_THRESHOLD: f64 = 1e11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Interpret a number as Unix seconds or milliseconds
    pub fn from_unix(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let millis = if value.abs() >= MILLIS_THRESHOLD {
            value
        } else {
            value * 1000.0
        };
        Utc.timestamp_millis_opt(millis.round() as i64)
            .single()
            .map(Self)
    }

    /// Parse RFC 3339, a naive ISO-8601 date-time (assumed UTC), a bare date,
    /// or a numeric string
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(Self(Utc.from_utc_datetime(&naive)));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).map(|n| Self(Utc.from_utc_datetime(&n)));
        }
        raw.parse::<f64>().ok().and_then(Self::from_unix)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Short form used by the inspector
    pub fn display(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M UTC").to_string()
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Int(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawTimestamp::deserialize(deserializer)?;
        let parsed = match &raw {
            RawTimestamp::Int(i) => Timestamp::from_unix(*i as f64),
            RawTimestamp::Float(f) => Timestamp::from_unix(*f),
            RawTimestamp::Text(s) => Timestamp::parse(s),
        };
        parsed.ok_or_else(|| {
            let shown = match raw {
                RawTimestamp::Int(i) => i.to_string(),
                RawTimestamp::Float(f) => f.to_string(),
                RawTimestamp::Text(s) => s,
            };
            serde::de::Error::custom(format!("unrecognized timestamp: {}", shown))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expected() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
    }

    #[test]
    fn parses_all_three_encodings_to_the_same_instant() {
        let iso: Timestamp = serde_json::from_value(json!("2024-03-01T12:30:00Z")).unwrap();
        let secs: Timestamp = serde_json::from_value(json!(1_709_296_200)).unwrap();
        let millis: Timestamp = serde_json::from_value(json!(1_709_296_200_000_i64)).unwrap();

        assert_eq!(iso, expected());
        assert_eq!(secs, expected());
        assert_eq!(millis, expected());
    }

    #[test]
    fn accepts_offsets_naive_and_bare_dates() {
        assert_eq!(Timestamp::parse("2024-03-01T14:30:00+02:00"), Some(expected()));
        assert_eq!(Timestamp::parse("2024-03-01 12:30:00"), Some(expected()));
        let midnight = Timestamp::parse("2024-03-01").unwrap();
        assert_eq!(midnight.display(), "2024-03-01 00:00 UTC");
        assert_eq!(Timestamp::parse("1709296200"), Some(expected()));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse("yesterday-ish").is_none());
        assert!(Timestamp::parse("   ").is_none());
        let err = serde_json::from_value::<Timestamp>(json!("nope")).unwrap_err();
        assert!(err.to_string().contains("unrecognized timestamp"));
    }

    #[test]
    fn display_is_minute_precision_utc() {
        assert_eq!(expected().display(), "2024-03-01 12:30 UTC");
    }
}
