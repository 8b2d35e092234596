//! RFC 3339 timestamps with fixed millisecond precision.
//!
//! Documents store timestamps as strings like `2026-01-01T12:00:00.000Z`.
//! Fixed width means lexical order equals chronological order, which the
//! document store relies on when sorting by a timestamp field.
//!
//! Use with `#[serde(with = "food_order_core::timestamp")]`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format a timestamp in the canonical document representation.
#[must_use]
pub fn format(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize a timestamp in the canonical representation.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(at))
}

/// Deserialize any RFC 3339 timestamp into UTC.
///
/// # Errors
///
/// Returns a deserialization error for strings that are not RFC 3339.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}
