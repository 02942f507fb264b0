//! Core data types for the accumulator layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Tag set attached to a measurement (e.g. `server`, `port`).
pub type TagMap = BTreeMap<String, String>;

/// Field set of unsigned counters.
pub type FieldMap = BTreeMap<String, u64>;

/// A named measurement carrying a tag set and a counter field set.
///
/// Created fresh per successful parse and handed to the accumulator
/// immediately; nothing is retained across cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measurement {
    /// Measurement name (e.g. `"nginx"`).
    pub name: String,
    /// Collection timestamp (UTC).
    pub ts: DateTime<Utc>,
    /// Identity tags.
    pub tags: TagMap,
    /// Counter values.
    pub fields: FieldMap,
}

impl Measurement {
    /// Create a measurement stamped with the current time.
    pub fn new(name: impl Into<String>, fields: FieldMap, tags: TagMap) -> Self {
        Self {
            name: name.into(),
            ts: Utc::now(),
            tags,
            fields,
        }
    }
}

/// A captured per-endpoint failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// Capture timestamp (UTC).
    pub ts: DateTime<Utc>,
    /// Human-readable failure description.
    pub message: String,
}

impl ErrorRecord {
    /// Create an error record stamped with the current time.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            message: message.into(),
        }
    }
}

/// Transport envelope drained from a [`ChannelAccumulator`] by the
/// host.
///
/// [`ChannelAccumulator`]: crate::accumulator::ChannelAccumulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    /// A successfully parsed measurement.
    Measurement(Measurement),
    /// A per-endpoint failure.
    Error(ErrorRecord),
}
