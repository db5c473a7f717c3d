//! Millisecond precision UTC instants.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// A UTC instant with millisecond precision, counted from the Unix epoch.
///
/// Stores persist timestamps at this precision, so comparing a value read
/// back from a store with [`Timestamp::now`] never fails on sub-millisecond
/// noise. The textual form, used by `Display` and serde, is RFC 3339 in UTC
/// with millisecond digits.
///
/// # Examples
/// ```
/// use fxatlas_core::Timestamp;
///
/// let earlier = Timestamp::from_millis(1_700_000_000_000);
/// assert!(Timestamp::now() > earlier);
/// assert_eq!(earlier.as_millis(), 1_700_000_000_000);
/// assert_eq!(earlier.to_string(), "2023-11-14T22:13:20.000Z");
/// assert_eq!("2023-11-14T22:13:20.000Z".parse(), Ok(earlier));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The current wall-clock time.
    ///
    /// Clocks set before 1970 clamp to the epoch.
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
    }

    /// Wrap a raw millisecond count.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the Unix epoch.
    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only instants beyond chrono's year range fall back to raw millis.
        match DateTime::<Utc>::from_timestamp_millis(self.0) {
            Some(at) => f.write_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Error returned when text is not an RFC 3339 timestamp.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid RFC 3339 timestamp {input:?}: {source}")]
pub struct ParseTimestampError {
    input: String,
    #[source]
    source: chrono::ParseError,
}

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|at| Self(at.timestamp_millis()))
            .map_err(|source| ParseTimestampError {
                input: s.to_owned(),
                source,
            })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

/// Accepts RFC 3339 text and, for older artefacts, raw epoch milliseconds.
#[cfg(feature = "serde")]
struct TimestampVisitor;

#[cfg(feature = "serde")]
impl serde::de::Visitor<'_> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an RFC 3339 timestamp or epoch milliseconds")
    }

    fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value.parse().map_err(E::custom)
    }

    fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Timestamp(value))
    }

    fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<Self::Value, E> {
        i64::try_from(value)
            .map(Timestamp)
            .map_err(|_| E::custom(format!("epoch milliseconds {value} out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "1970-01-01T00:00:00.000Z")]
    #[case(1_700_000_000_123, "2023-11-14T22:13:20.123Z")]
    fn displays_as_rfc3339(#[case] millis: i64, #[case] expected: &str) {
        assert_eq!(Timestamp::from_millis(millis).to_string(), expected);
    }

    #[rstest]
    fn parses_offsets_into_utc() {
        let parsed: Timestamp = "2023-11-15T00:13:20.123+02:00"
            .parse()
            .expect("valid timestamp");
        assert_eq!(parsed, Timestamp::from_millis(1_700_000_000_123));
    }

    #[rstest]
    fn rejects_non_rfc3339_text() {
        let err = "yesterday".parse::<Timestamp>().expect_err("not a timestamp");
        assert!(err.to_string().contains("yesterday"));
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn serialises_as_rfc3339_string() {
        let at = Timestamp::from_millis(1_700_000_000_000);
        let json = serde_json::to_string(&at).expect("serialise");
        assert_eq!(json, "\"2023-11-14T22:13:20.000Z\"");
        let back: Timestamp = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, at);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn reads_legacy_epoch_millis() {
        let back: Timestamp = serde_json::from_str("1700000000000").expect("deserialise");
        assert_eq!(back, Timestamp::from_millis(1_700_000_000_000));
    }
}
