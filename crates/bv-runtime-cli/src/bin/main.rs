//! BV runtime diagnostics CLI
//!
//! Logging goes to stderr and defaults to `warn`. `-v` raises it to `info`,
//! `-vv` to `debug`, `-vvv` to `trace`; `--quiet` keeps only errors.
//! `RUST_LOG` directives are applied on top.

use clap::Parser;
use bv_runtime_cli::{run_cli, RuntimeCli};
use tracing::Level;

fn main() {
    let cli = RuntimeCli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = run_cli(cli);
    std::process::exit(exit_code.into());
}
