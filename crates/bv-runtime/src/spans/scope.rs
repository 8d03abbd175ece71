//! Scoped spans.

use bv_span::{new_span_id, SpanStatus};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::emitter::Tracer;
use super::options::SpanOptions;

/// A span that is open until [`finish`](SpanScope::finish) or drop
///
/// The span is recorded exactly once, on whichever exit path comes first.
/// A scope dropped while its thread is panicking is recorded as an error.
#[derive(Debug)]
pub struct SpanScope {
    tracer: Tracer,
    options: SpanOptions,
    span_id: String,
    started_at: DateTime<Utc>,
    error: Option<String>,
    closed: bool,
}

impl SpanScope {
    pub(crate) fn open(tracer: Tracer, mut options: SpanOptions, started_at: DateTime<Utc>) -> Self {
        let span_id = options.span_id.take().unwrap_or_else(new_span_id);
        Self {
            tracer,
            options,
            span_id,
            started_at,
            error: None,
            closed: false,
        }
    }

    /// Id this span will be reported under; use it as the parent of nested spans
    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Options for a span nested under this one
    pub fn child(&self, name: impl Into<String>) -> SpanOptions {
        SpanOptions::new(name).parent(self.span_id.clone())
    }

    /// Mark the span as failed; it is still recorded when the scope ends
    ///
    /// A later `Err` or panic from a traced body replaces this error.
    pub fn fail(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }

    pub fn set_output(&mut self, output: impl Into<Value>) {
        self.options.output = Some(output.into());
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.options
            .metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
    }

    /// Close the span now
    pub fn finish(mut self) {
        self.close(Utc::now());
    }

    pub(crate) fn finish_with_error(mut self, error: String) {
        self.error = Some(error);
        self.close(Utc::now());
    }

    fn close(&mut self, ended_at: DateTime<Utc>) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut options = std::mem::take(&mut self.options);
        options.span_id = Some(self.span_id.clone());
        options.start_time = Some(self.started_at);
        options.end_time = None;
        options.duration_ms = None;

        let mut record = options.into_record(self.started_at);
        record.metadata.get_or_insert_with(Map::new);
        match self.error.take() {
            Some(error) => record.fail_at(error, ended_at),
            None => record.finish_at(SpanStatus::Ok, ended_at),
        }

        self.tracer.emit_record(record);
    }
}

impl Drop for SpanScope {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if std::thread::panicking() && self.error.is_none() {
            self.error = Some("panicked".to_string());
        }
        self.close(Utc::now());
    }
}
