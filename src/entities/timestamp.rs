//! Serde adapters for stored instants.
//!
//! Writes RFC 3339 in UTC. Reads RFC 3339 and the Postgres `timestamptz`
//! renderings older data files contain (`2026-01-22 21:30:00+1100`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::time::parse_timestamp;

fn parse<E: serde::de::Error>(raw: &str) -> Result<DateTime<Utc>, E> {
    parse_timestamp(raw).map(|dt| dt.with_timezone(&Utc)).map_err(E::custom)
}

pub mod required {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
    }
}

pub mod optional {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw).map(Some),
            None => Ok(None),
        }
    }
}
