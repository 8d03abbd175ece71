//! BV Runtime
//!
//! Resolves the identity a process runs under and reports trace spans for
//! the execution it belongs to.
//!
//! ## Features
//!
//! - **Identity resolution**: runner-issued machine credentials (SQLite store
//!   keyed by pid) take priority over the developer credential file
//!   (`~/.bv/auth.json`)
//! - **Expiry enforcement**: expired developer credentials are rejected;
//!   runner identities are exempt
//! - **Activation guard**: runtime features only activate under `bv run` or
//!   inside a runner context
//! - **Span emission**: best-effort, never fails the caller's program
//!
//! ## Architecture
//!
//! 1. **Env** (`env`): explicit snapshot of the environment variables and
//!    process id every decision is made from.
//! 2. **Auth** (`auth`): identity sources, the source chain, and the resolved
//!    `AuthContext`.
//! 3. **Guard** (`guard`): activation predicate.
//! 4. **Client** (`client`): blocking orchestrator client behind the
//!    `SpanTransport` seam.
//! 5. **Spans** (`spans`): one-shot and scoped span emission.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bv_runtime::{record_span, require_auth, SpanOptions};
//!
//! let ctx = require_auth()?;
//! println!("authenticated against {}", ctx.api_url());
//!
//! record_span(SpanOptions::new("warmup").meta("rows", 120))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod auth;
pub mod client;
pub mod env;
pub mod error;
pub mod guard;
pub mod spans;

pub use auth::{AuthContext, AuthUser, ExecutionMode};
pub use bv_span::{SpanBatch, SpanRecord, SpanStatus};
pub use client::{ClientError, OrchestratorClient, OrchestratorTransport, SpanTransport};
pub use env::{ClientConfig, RuntimeEnv};
pub use error::{AuthError, AuthResult, GuardError};
pub use guard::{is_run_context, require_run_context};
pub use spans::{SpanOptions, SpanScope, Tracer};

/// Runtime version (from Cargo.toml)
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve the identity of the current process
pub fn load_auth_context() -> AuthResult<AuthContext> {
    auth::load_auth_context(&RuntimeEnv::from_env())
}

/// Resolve the identity of the current process, rejecting expired credentials
pub fn require_auth() -> AuthResult<AuthContext> {
    auth::require_auth(&RuntimeEnv::from_env())
}

/// Send one span for the current process's execution
pub fn record_span(options: SpanOptions) -> std::result::Result<(), GuardError> {
    Tracer::from_env().record_span(options)
}

/// Run `body` inside a span for the current process's execution
pub fn trace_span<T, E, F>(options: SpanOptions, body: F) -> std::result::Result<T, E>
where
    F: FnOnce(&mut SpanScope) -> std::result::Result<T, E>,
    E: std::fmt::Display + From<GuardError>,
{
    Tracer::from_env().trace(options, body)
}
