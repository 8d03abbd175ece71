//! Activation guard for runtime features
//!
//! Orchestrator-attributing features (span emission and anything else that
//! reports on behalf of an execution) may only be used when the process was
//! started by `bv run` (`BV_SDK_RUN=1`) or by a BV runner (a row exists for
//! this pid in the runner store). The check reads only the explicit
//! [`RuntimeEnv`] snapshot it is given.

use crate::auth::has_runner_context;
use crate::env::RuntimeEnv;
use crate::error::GuardError;

/// Whether runtime features may activate for this snapshot
pub fn is_run_context(env: &RuntimeEnv) -> bool {
    env.sdk_run() || has_runner_context(env)
}

/// Fail with [`GuardError::NotInRunContext`] outside a BV execution
pub fn require_run_context(env: &RuntimeEnv) -> Result<(), GuardError> {
    if is_run_context(env) {
        Ok(())
    } else {
        Err(GuardError::NotInRunContext)
    }
}
