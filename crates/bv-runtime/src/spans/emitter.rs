//! Best-effort span emission
//!
//! [`Tracer`] sends spans to the orchestrator's agent-trace endpoint for the
//! current execution. Emission never fails the caller's program:
//!
//! - Outside a BV execution the guard error is returned; this is an
//!   integration mistake, not a telemetry fault.
//! - Without an execution id there is nothing to attribute the span to, so
//!   emission is a silent no-op.
//! - Every delivery failure (auth, network, server, serialization, even a
//!   panicking transport) is logged at `debug` and dropped.

use bv_span::{SpanBatch, SpanRecord};
use chrono::Utc;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::options::SpanOptions;
use super::scope::SpanScope;
use crate::client::{OrchestratorTransport, SpanTransport};
use crate::env::{ClientConfig, RuntimeEnv};
use crate::error::GuardError;
use crate::guard::require_run_context;

/// Span emitter bound to one environment snapshot and transport
#[derive(Clone)]
pub struct Tracer {
    env: RuntimeEnv,
    transport: Arc<dyn SpanTransport>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("execution_id", &self.env.execution_id())
            .finish_non_exhaustive()
    }
}

impl Tracer {
    pub fn new(env: RuntimeEnv, transport: Arc<dyn SpanTransport>) -> Self {
        Self { env, transport }
    }

    /// Tracer for the live process, delivering through the orchestrator API
    pub fn from_env() -> Self {
        let env = RuntimeEnv::from_env();
        let transport = OrchestratorTransport::new(env.clone(), ClientConfig::from_env());
        Self::new(env, Arc::new(transport))
    }

    pub fn env(&self) -> &RuntimeEnv {
        &self.env
    }

    /// Send a single span
    pub fn record_span(&self, options: SpanOptions) -> Result<(), GuardError> {
        require_run_context(&self.env)?;
        self.emit(options);
        Ok(())
    }

    /// Open a span that is recorded when the returned scope ends
    pub fn start_span(&self, options: SpanOptions) -> Result<SpanScope, GuardError> {
        require_run_context(&self.env)?;
        Ok(SpanScope::open(self.clone(), options, Utc::now()))
    }

    /// Run `body` inside a span
    ///
    /// The span is recorded with status `error` and `metadata.error` set to
    /// the error text when the body returns `Err`, and the error is handed
    /// back unchanged. A panicking body is recorded the same way and the
    /// panic is then resumed. The body may annotate its own span through
    /// the scope it is given.
    pub fn trace<T, E, F>(&self, options: SpanOptions, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut SpanScope) -> Result<T, E>,
        E: fmt::Display + From<GuardError>,
    {
        let mut scope = self.start_span(options)?;
        match panic::catch_unwind(AssertUnwindSafe(|| body(&mut scope))) {
            Ok(Ok(value)) => {
                scope.finish();
                Ok(value)
            }
            Ok(Err(err)) => {
                scope.finish_with_error(err.to_string());
                Err(err)
            }
            Err(payload) => {
                scope.finish_with_error(panic_message(payload.as_ref()));
                panic::resume_unwind(payload)
            }
        }
    }

    /// Build and deliver a span, skipping the guard
    pub(crate) fn emit(&self, options: SpanOptions) {
        self.emit_record(options.into_record(Utc::now()));
    }

    /// Deliver a finished record, skipping the guard
    pub(crate) fn emit_record(&self, record: SpanRecord) {
        let Some(execution_id) = self.env.execution_id() else {
            tracing::trace!(span = %record.name, "No execution id, span not sent");
            return;
        };

        self.deliver(execution_id, record);
    }

    fn deliver(&self, execution_id: &str, record: SpanRecord) {
        let span_id = record.span_id.clone();
        let batch = SpanBatch::single(execution_id, record);

        match panic::catch_unwind(AssertUnwindSafe(|| self.transport.send_spans(&batch))) {
            Ok(Ok(())) => {
                tracing::debug!(execution_id, span_id = %span_id, "Span delivered");
            }
            Ok(Err(e)) => {
                tracing::debug!(
                    execution_id,
                    span_id = %span_id,
                    error = %e,
                    "Failed to deliver span, dropping"
                );
            }
            Err(_) => {
                tracing::debug!(execution_id, span_id = %span_id, "Span transport panicked, dropping");
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, MockSpanTransport};
    use crate::env::SDK_RUN_VAR;
    use bv_span::SpanStatus;

    fn sdk_env(dir: &tempfile::TempDir, execution_id: Option<&str>) -> RuntimeEnv {
        RuntimeEnv::from_vars([(SDK_RUN_VAR, "1")])
            .with_auth_dir(dir.path())
            .with_execution_id(execution_id)
    }

    #[test]
    fn test_guard_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let env = RuntimeEnv::from_vars([("BV_JOB_EXECUTION_ID", "e1")]).with_auth_dir(dir.path());
        let mut transport = MockSpanTransport::new();
        transport.expect_send_spans().times(0);

        let tracer = Tracer::new(env, Arc::new(transport));
        assert_eq!(
            tracer.record_span(SpanOptions::new("x")),
            Err(GuardError::NotInRunContext)
        );
    }

    #[test]
    fn test_no_execution_id_is_silent_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport = MockSpanTransport::new();
        transport.expect_send_spans().times(0);

        let tracer = Tracer::new(sdk_env(&dir, None), Arc::new(transport));
        assert!(tracer.record_span(SpanOptions::new("x")).is_ok());
    }

    #[test]
    fn test_span_is_sent_for_execution() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport = MockSpanTransport::new();
        transport
            .expect_send_spans()
            .withf(|batch| {
                batch.trace_id == "exec-5"
                    && batch.spans.len() == 1
                    && batch.spans[0].name == "fetch"
                    && batch.spans[0].status == SpanStatus::Ok
                    && batch.endpoint_path() == "/api/agent-traces/exec-5/spans"
            })
            .times(1)
            .returning(|_| Ok(()));

        let tracer = Tracer::new(sdk_env(&dir, Some("exec-5")), Arc::new(transport));
        tracer.record_span(SpanOptions::new("fetch")).unwrap();
    }

    #[test]
    fn test_transport_errors_are_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport = MockSpanTransport::new();
        transport
            .expect_send_spans()
            .times(1)
            .returning(|_| Err(ClientError::Network("connection refused".to_string())));

        let tracer = Tracer::new(sdk_env(&dir, Some("exec-5")), Arc::new(transport));
        assert!(tracer.record_span(SpanOptions::new("fetch")).is_ok());
    }

    struct PanickingTransport;

    impl SpanTransport for PanickingTransport {
        fn send_spans(&self, _batch: &SpanBatch) -> Result<(), ClientError> {
            panic!("transport exploded")
        }
    }

    #[test]
    fn test_transport_panic_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let tracer = Tracer::new(sdk_env(&dir, Some("exec-5")), Arc::new(PanickingTransport));
        assert!(tracer.record_span(SpanOptions::new("fetch")).is_ok());
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static msg");
        assert_eq!(panic_message(boxed.as_ref()), "static msg");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned msg"));
        assert_eq!(panic_message(boxed.as_ref()), "owned msg");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "panic");
    }
}
