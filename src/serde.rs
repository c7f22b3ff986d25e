use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;
use serde_json::{Map, Value};

/// Formats a time the way browsers print `Date.toISOString()`.
pub(crate) fn iso8601(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time, formatted with [`iso8601`].
pub(crate) fn now_iso8601() -> String {
    iso8601(&Utc::now())
}

/// Set `serialize_with` to this fn to write a time with millisecond precision.
pub(crate) fn serialize_iso8601<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&iso8601(time))
}

/// Same as [`serialize_iso8601`] for optional fields. Pair it with
/// `skip_serializing_if = "Option::is_none"`.
pub(crate) fn serialize_iso8601_opt<S>(
    time: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match time {
        Some(time) => serialize_iso8601(time, serializer),
        None => serializer.serialize_none(),
    }
}

/// Drops top-level keys whose value is `null`.
pub(crate) fn strip_nulls(map: &mut Map<String, Value>) {
    map.retain(|_, value| !value.is_null());
}
