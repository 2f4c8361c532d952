use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Layout of the `time` field returned by the forecast API, e.g. `2024-01-01T00:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse a remote timestamp in `YYYY-MM-DDTHH:MM` form.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|source| Error::Parse {
        text: text.to_string(),
        source,
    })
}

/// A single timestamped temperature observation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    location: String,
    #[serde(with = "minute_format")]
    timestamp: NaiveDateTime,
    temperature: f64,
}

impl Reading {
    pub fn new(location: impl Into<String>, timestamp: NaiveDateTime, temperature: f64) -> Self {
        Self {
            location: location.into(),
            timestamp,
            temperature,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

pub(crate) mod minute_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
