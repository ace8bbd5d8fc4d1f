//! Durations in job files.
//!
//! Accepts an integer number of seconds (`10`) or a `humantime` string
//! (`250ms`, `5s`, `2m`, `1h 30m`).

use std::time::Duration;

use serde::de::Error;
use serde::{Deserialize, Deserializer};

/// Serde adapter for `deserialize_with`. Zero durations are rejected.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    let duration = match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Duration::from_secs(secs),
        Raw::Text(text) => humantime::parse_duration(text.trim())
            .map_err(|e| D::Error::custom(format!("invalid duration '{}': {}", text, e)))?,
    };
    if duration.is_zero() {
        return Err(D::Error::custom("duration must be positive"));
    }
    Ok(duration)
}
