//! Error types for the diagnostic CLI

use bv_runtime::{AuthError, GuardError};
use thiserror::Error;

use crate::cli::ExitCode;

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CliError {
    /// Check if the error was caused by the invocation or local setup
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CliError::Serialization(_))
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Auth(AuthError::TokenExpired) => ExitCode::TokenExpired,
            CliError::Auth(AuthError::NotAuthenticated) | CliError::Guard(_) => {
                ExitCode::NotAuthenticated
            }
            CliError::Auth(_) | CliError::InvalidInput(_) => ExitCode::InvalidInput,
            CliError::Serialization(_) => ExitCode::InternalError,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
