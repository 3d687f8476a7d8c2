//! Timestamp type for notification creation times.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// UTC instant with millisecond precision.
///
/// Serializes as an RFC 3339 string. Deserializes from either an ISO-8601
/// string or an integer count of milliseconds since the Unix epoch, which
/// are the two shapes the server emits for `createdAt` and `timestamp`.
///
/// # Examples
///
/// ```
/// use herald_core::types::Timestamp;
///
/// let a: Timestamp = serde_json::from_str("\"2024-01-01T00:00:00Z\"").unwrap();
/// let b: Timestamp = serde_json::from_str("1704067200000").unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a `Timestamp` from milliseconds since Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Converts to a `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.0)
            .single()
            .unwrap_or_default()
    }

    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    /// Formats the timestamp as RFC 3339 with millisecond precision.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl FromStr for Timestamp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(millis) = trimmed.parse::<i64>() {
            return Ok(Self(millis));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
            .map_err(|_| ValidationError::InvalidTimestamp(s.to_string()))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.to_datetime()
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimestampVisitor;

        impl Visitor<'_> for TimestampVisitor {
            type Value = Timestamp;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an ISO-8601 string or epoch milliseconds")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Timestamp(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map(Timestamp)
                    .map_err(|_| E::custom(format!("timestamp out of range: {v}")))
            }

            #[allow(clippy::cast_possible_truncation)]
            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Timestamp(v as i64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(TimestampVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YEAR_2024: i64 = 1_704_067_200_000;

    #[test]
    fn test_timestamp_now() {
        assert!(Timestamp::now().as_millis() > NEW_YEAR_2024);
    }

    #[test]
    fn test_parse_iso_and_epoch() {
        let iso: Timestamp = "2024-01-01T00:00:00.000Z".parse().unwrap();
        let epoch: Timestamp = "1704067200000".parse().unwrap();
        assert_eq!(iso.as_millis(), NEW_YEAR_2024);
        assert_eq!(iso, epoch);
    }

    #[test]
    fn test_parse_with_offset() {
        let ts: Timestamp = "2024-01-01T02:00:00+02:00".parse().unwrap();
        assert_eq!(ts.as_millis(), NEW_YEAR_2024);
    }

    #[test]
    fn test_parse_garbage() {
        let result = "yesterday".parse::<Timestamp>();
        assert!(matches!(result, Err(ValidationError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_display_is_rfc3339() {
        let ts = Timestamp::from_millis(NEW_YEAR_2024);
        assert_eq!(ts.to_string(), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_deserialize_both_shapes() {
        let a: Timestamp = serde_json::from_str("\"2024-01-01T00:00:00Z\"").unwrap();
        let b: Timestamp = serde_json::from_str("1704067200000").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Timestamp>("true").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let ts = Timestamp::from_millis(NEW_YEAR_2024);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-01-01T00:00:00.000Z\"");
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }
}
