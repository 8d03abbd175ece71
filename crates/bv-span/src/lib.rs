//! Span wire types for BV agent-trace telemetry.
//!
//! This crate provides the record types the runtime serializes when it
//! reports a unit of work to the orchestrator's agent-trace endpoint.
//!
//! # Wire Shape
//!
//! ```text
//! POST /api/agent-traces/{execution_id}/spans
//! {
//!   "traceId": "<execution id>",
//!   "spans": [ { "spanId", "parentSpanId", "name", "status", "startTime",
//!                "endTime", "durationMs", "input", "output", "metadata", "tags" } ]
//! }
//! ```
//!
//! # Usage
//!
//! 1. Build a `SpanRecord` (directly or through the runtime's tracer).
//! 2. Wrap it in a `SpanBatch` keyed by the execution id.
//! 3. POST the batch to `SpanBatch::endpoint_path()`.

pub mod batch;
pub mod span;

pub use batch::SpanBatch;
pub use span::{duration_ms_between, new_span_id, SpanRecord, SpanStatus};
