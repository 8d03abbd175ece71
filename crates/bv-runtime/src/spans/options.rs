//! Span options builder.

use bv_span::{SpanRecord, SpanStatus};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Everything a caller may say about a span before it is emitted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanOptions {
    pub name: String,
    pub status: SpanStatus,
    /// Preassigned id; a fresh one is generated when unset
    pub span_id: Option<String>,
    pub parent_span_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub metadata: Option<Map<String, Value>>,
    pub tags: Option<Vec<String>>,
}

impl SpanOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn status(mut self, status: SpanStatus) -> Self {
        self.status = status;
        self
    }

    pub fn span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    pub fn parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    pub fn start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn end_time(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    pub fn duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn input(mut self, input: impl Into<Value>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn output(mut self, output: impl Into<Value>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Build the wire record, filling in defaults relative to `now`
    ///
    /// The start defaults to `now`. When no non-zero duration was given and
    /// an end time is known, the duration is the whole milliseconds between
    /// start and end.
    pub fn into_record(self, now: DateTime<Utc>) -> SpanRecord {
        let mut record = SpanRecord::starting_at(self.name, self.start_time.unwrap_or(now));
        if let Some(span_id) = self.span_id {
            record.span_id = span_id;
        }

        record.parent_span_id = self.parent_span_id;
        record.status = self.status;
        record.duration_ms = self.duration_ms;
        record.input = self.input;
        record.output = self.output;
        record.metadata = self.metadata;
        record.tags = self.tags;

        if let Some(end) = self.end_time {
            record.finish_at(self.status, end);
        }
        record
    }
}
