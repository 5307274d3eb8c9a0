//! Decoding rules for the Graph API wire format that serde does not cover
//! out of the box: the timestamp format and the several shapes a list can
//! take on the wire.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Flatten a Graph list value into an ordered `Vec`.
///
/// Accepts a JSON array, a connection object (`{"data": [...]}`), or an
/// object keyed by arbitrary indices (`{"0": {...}, "1": {...}}`). Keyed
/// objects yield their values in the order the keys were received. `null`
/// is an empty list.
///
/// A connection carries metadata next to `data` (`paging`, `summary`,
/// `count`) and only `data` is read. An object without `data` is a keyed
/// list only when every value is an object and none of the keys is a
/// connection metadata key; anything else, such as `{"count": 0}`, is a
/// connection whose entries were not requested and yields no elements.
pub fn list_from_value<T: DeserializeOwned>(value: &Value) -> Result<Vec<T>, serde_json::Error> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(T::deserialize).collect(),
        Value::Object(map) => match map.get("data") {
            Some(data @ (Value::Array(_) | Value::Null)) => list_from_value(data),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected connection data to be an array, found {}",
                kind(other)
            ))),
            None if is_keyed_list(map) => map.values().map(T::deserialize).collect(),
            None => Ok(Vec::new()),
        },
        other => Err(serde::de::Error::custom(format!(
            "expected a list, connection or keyed object, found {}",
            kind(other)
        ))),
    }
}

const CONNECTION_METADATA: [&str; 3] = ["paging", "summary", "count"];

fn is_keyed_list(map: &Map<String, Value>) -> bool {
    map.iter()
        .all(|(key, value)| value.is_object() && !CONNECTION_METADATA.contains(&key.as_str()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `deserialize_with` adapter over [`list_from_value`] for `Option<Vec<T>>`
/// fields. Combine with `#[serde(default)]` so an absent field stays `None`.
pub mod graph_list {
    use super::*;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        list_from_value(&value)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// Graph timestamps: `2011-03-13T01:00:49+0000`.
pub mod graph_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_str(s, FORMAT).map(|dt| dt.with_timezone(&Utc))
    }

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.format(FORMAT).to_string()
    }

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match dt {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| super::parse(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
