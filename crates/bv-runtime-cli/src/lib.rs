//! BV runtime diagnostics
//!
//! Library side of the `bv-runtime` binary: command definitions, output
//! rendering, and exit code mapping. Everything here is a thin layer over
//! the `bv-runtime` crate.
//!
//! # Usage
//!
//! ```bash
//! # Show the identity this process resolves to
//! bv-runtime whoami --format json
//!
//! # Exit 0 when runtime features are active, 1 otherwise
//! bv-runtime check
//!
//! # Send a span for the current execution
//! BV_SDK_RUN=1 BV_JOB_EXECUTION_ID=exec-1 bv-runtime span warmup --tag smoke
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Not authenticated, or not inside a BV execution
//! - 2: Developer token expired
//! - 3: Invalid input or credential file
//! - 10: Internal error

pub mod cli;
pub mod error;

pub use cli::{ExitCode, RuntimeCli, RuntimeCommands};
pub use error::CliError;

/// Run the CLI and map failures to an exit code
///
/// # Example
///
/// ```rust,no_run
/// use clap::Parser;
/// use bv_runtime_cli::{run_cli, RuntimeCli};
///
/// let cli = RuntimeCli::parse();
/// std::process::exit(run_cli(cli).into());
/// ```
pub fn run_cli(cli: RuntimeCli) -> ExitCode {
    report(cli::run(cli))
}

/// Map a command result to an exit code, printing the error if there is one
pub fn report(result: Result<ExitCode, CliError>) -> ExitCode {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            if !e.is_user_error() {
                tracing::error!(error = %e, "Internal error");
            }
            e.exit_code()
        }
    }
}
