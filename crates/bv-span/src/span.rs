//! Core span record types.
//!
//! Defines `SpanRecord` and `SpanStatus`, the write-once unit reported for
//! every traced piece of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    #[default]
    Ok,
    Error,
}

impl SpanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Ok => "ok",
            SpanStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SpanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" => Ok(SpanStatus::Ok),
            "error" => Ok(SpanStatus::Error),
            other => Err(format!("unknown span status: {}", other)),
        }
    }
}

/// A single span as sent to the orchestrator.
///
/// Optional fields serialize as JSON `null` rather than being omitted; the
/// trace endpoint expects every key to be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanRecord {
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub status: SpanStatus,
    #[serde(with = "iso8601")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso8601::option")]
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub tags: Option<Vec<String>>,
}

impl SpanRecord {
    /// Create a span starting now with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::starting_at(name, Utc::now())
    }

    /// Create a span with an explicit start instant.
    pub fn starting_at(name: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            span_id: new_span_id(),
            parent_span_id: None,
            name: name.into(),
            status: SpanStatus::Ok,
            start_time,
            end_time: None,
            duration_ms: None,
            input: None,
            output: None,
            metadata: None,
            tags: None,
        }
    }

    /// Close the span at `end_time` with the given status.
    ///
    /// A duration that was already set to a non-zero value is kept; otherwise
    /// it is derived from the start and end instants.
    pub fn finish_at(&mut self, status: SpanStatus, end_time: DateTime<Utc>) {
        self.status = status;
        self.end_time = Some(end_time);
        if self.duration_ms.unwrap_or(0) == 0 {
            self.duration_ms = Some(duration_ms_between(self.start_time, end_time));
        }
    }

    /// Close the span at `end_time` as failed, recording the error text
    /// under `metadata.error`.
    pub fn fail_at(&mut self, error: impl Into<String>, end_time: DateTime<Utc>) {
        self.insert_metadata("error", serde_json::Value::String(error.into()));
        self.finish_at(SpanStatus::Error, end_time);
    }

    /// Set one metadata key, creating the map if needed.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value);
    }

    /// Text recorded under `metadata.error`, if any.
    pub fn error_text(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("error"))
            .and_then(|v| v.as_str())
    }
}

/// Generate a fresh span identifier.
pub fn new_span_id() -> String {
    Uuid::new_v4().to_string()
}

/// Whole milliseconds elapsed from `start` to `end`, truncated toward zero.
pub fn duration_ms_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let delta = end - start;
    match delta.num_microseconds() {
        Some(us) => us / 1000,
        None => delta.num_milliseconds(),
    }
}

/// ISO-8601 timestamps with an explicit `+00:00` offset and microsecond
/// precision.
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_str(&super::format(dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}
