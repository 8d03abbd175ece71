//! Execution identity resolution
//!
//! A process can be authenticated in one of two ways:
//!
//! - **Runner mode**: launched by the BV runner, which records machine
//!   credentials and the execution id in a local SQLite store keyed by pid.
//! - **Developer mode**: an interactive SDK session using the credential
//!   file written by `bv auth login`.
//!
//! [`load_auth_context`] tries the runner store first and falls back to the
//! credential file. [`require_auth`] additionally rejects expired developer
//! credentials. Only a named user is checked: machine identities and files
//! without a username are exempt.
//!
//! # Example
//!
//! ```rust,no_run
//! use bv_runtime::auth::require_auth;
//! use bv_runtime::RuntimeEnv;
//!
//! let env = RuntimeEnv::from_env();
//! let ctx = require_auth(&env)?;
//! println!("running as {:?} against {}", ctx.user().username, ctx.api_url());
//! # Ok::<(), bv_runtime::AuthError>(())
//! ```

pub mod chain;
pub mod context;
pub mod credentials;
pub mod runner;

pub use chain::{IdentitySource, SourceChain};
pub use context::{AuthContext, AuthUser, ExecutionMode, ROBOT_USERNAME};
pub use credentials::CredentialFile;
pub use runner::{has_runner_context, RunnerRecord, RunnerStore};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::env::RuntimeEnv;
use crate::error::{AuthError, AuthResult};

/// Machine name used when no source provides one
pub const UNKNOWN_MACHINE: &str = "<unknown>";

/// Resolve the execution identity for the snapshot's process
pub fn load_auth_context(env: &RuntimeEnv) -> AuthResult<AuthContext> {
    SourceChain::for_env(env).resolve()
}

/// Resolve the identity and reject expired developer credentials
pub fn require_auth(env: &RuntimeEnv) -> AuthResult<AuthContext> {
    let ctx = load_auth_context(env)?;
    if ctx.user().enforces_expiry() && ctx.is_expired() {
        return Err(AuthError::TokenExpired);
    }
    Ok(ctx)
}

/// Trim whitespace and trailing slashes from an orchestrator base URL
pub fn normalize_base_url(url: &str) -> AuthResult<String> {
    let normalized = url.trim().trim_end_matches('/');
    if normalized.is_empty() {
        return Err(AuthError::OrchestratorUrlMissing);
    }
    Ok(normalized.to_string())
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp
///
/// A trailing `Z` means UTC, timestamps without an offset are taken as UTC,
/// and a bare date is midnight UTC.
pub fn parse_iso8601(value: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = value.trim();
    let raw = match trimmed.strip_suffix('Z').or_else(|| trimmed.strip_suffix('z')) {
        Some(rest) => format!("{}+00:00", rest),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&raw, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(format!("Invalid isoformat string: '{}'", value))
}
