//! CLI module for the BV runtime diagnostics tool
//!
//! Inspects the identity a process would run under, checks whether runtime
//! features would activate, and sends one-off spans.

pub mod commands;
pub mod output;

pub use commands::{RuntimeCli, RuntimeCommands, StatusArg};
pub use output::{CheckOutput, OutputFormat, WhoamiOutput};

use bv_runtime::RuntimeEnv;

use crate::error::CliError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// No usable identity, or not inside a BV execution
    NotAuthenticated = 1,
    /// Developer credentials have expired
    TokenExpired = 2,
    /// Invalid arguments or credential file contents
    InvalidInput = 3,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Run the CLI against the live process environment
pub fn run(cli: RuntimeCli) -> Result<ExitCode, CliError> {
    run_with_env(cli, &RuntimeEnv::from_env())
}

/// Run the CLI against an explicit environment snapshot
pub fn run_with_env(cli: RuntimeCli, env: &RuntimeEnv) -> Result<ExitCode, CliError> {
    match cli.command {
        RuntimeCommands::Whoami { format } => commands::execute_whoami(env, format),
        RuntimeCommands::Check { format } => commands::execute_check(env, format),
        RuntimeCommands::Span {
            name,
            status,
            parent,
            tags,
            metadata,
        } => commands::execute_span(env, name, status, parent, tags, metadata),
    }
}
