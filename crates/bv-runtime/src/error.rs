//! Error types for the BV runtime
//!
//! Authentication and guard failures are surfaced to the caller with a
//! distinct variant per cause. Transport failures have their own type in
//! [`crate::client`] and never escape the span emitter.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving the execution identity
#[derive(Error, Debug)]
pub enum AuthError {
    /// Neither a runner context nor a credential file is available
    #[error("Not authenticated. Run bv auth login or execute inside a BV runner context")]
    NotAuthenticated,

    /// The credential file could not be read or has the wrong shape
    #[error("Invalid auth file at {}: {reason}", path.display())]
    InvalidAuthFile { path: PathBuf, reason: String },

    #[error("Invalid auth file: missing access_token. Run bv auth login")]
    MissingAccessToken,

    #[error("Invalid auth file: missing expires_at. Run bv auth login")]
    MissingExpiresAt,

    #[error("Invalid auth file: expires_at is not ISO8601: {0}")]
    InvalidExpiresAt(String),

    /// A developer credential is past its expiry
    #[error("Token expired. Run bv auth login")]
    TokenExpired,

    #[error("Orchestrator URL is missing")]
    OrchestratorUrlMissing,
}

impl AuthError {
    pub fn invalid_file(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AuthError::InvalidAuthFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether re-running the login flow is the fix for this error
    pub fn needs_login(&self) -> bool {
        !matches!(self, AuthError::OrchestratorUrlMissing)
    }
}

/// Raised when runtime features are used outside a BV execution context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("bv.runtime is only available when running via bv run or a BV runner context")]
    NotInRunContext,
}

/// Result type alias for identity resolution
pub type AuthResult<T> = std::result::Result<T, AuthError>;
