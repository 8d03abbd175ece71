//! Request body for the agent-trace span endpoint.

use serde::{Deserialize, Serialize};

use crate::span::SpanRecord;

/// Batch of spans attributed to one execution.
///
/// The orchestrator uses `trace_id` (the execution id) to attach every span
/// in the batch to the job run it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanBatch {
    pub trace_id: String,
    pub spans: Vec<SpanRecord>,
}

impl SpanBatch {
    /// Create a batch holding a single span.
    pub fn single(trace_id: impl Into<String>, span: SpanRecord) -> Self {
        Self {
            trace_id: trace_id.into(),
            spans: vec![span],
        }
    }

    /// API path the batch is posted to, relative to the orchestrator base URL.
    pub fn endpoint_path(&self) -> String {
        format!("/api/agent-traces/{}/spans", self.trace_id)
    }
}
