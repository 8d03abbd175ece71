//! CLI command definitions for the BV runtime diagnostics tool

use bv_runtime::{
    require_run_context, ClientConfig, OrchestratorTransport, RuntimeEnv, SpanOptions, Tracer,
};
use bv_span::{new_span_id, SpanStatus};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::output::{CheckOutput, OutputFormat, WhoamiOutput};
use super::ExitCode;
use crate::error::CliError;

/// BV runtime diagnostics
///
/// Shows the identity this process resolves to, whether runtime features
/// are active, and sends test spans.
#[derive(Parser, Debug)]
#[command(name = "bv-runtime")]
#[command(about = "BV runtime diagnostics - identity, activation, and spans", long_about = None)]
#[command(version)]
pub struct RuntimeCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: RuntimeCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum RuntimeCommands {
    /// Show the resolved identity
    ///
    /// Fails when no identity is available or developer credentials have
    /// expired. The access token is never printed.
    Whoami {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check whether runtime features are active for this process
    Check {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Queue a single span for the current execution
    ///
    /// Delivery is best-effort: the span id is printed once the span is
    /// handed to the transport, and delivery failures are only logged at
    /// debug level (run with -vv to see them).
    Span {
        /// Span name
        name: String,

        #[arg(long, value_enum, default_value = "ok")]
        status: StatusArg,

        /// Parent span id
        #[arg(long)]
        parent: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },
}

/// Span status as accepted on the command line
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum StatusArg {
    Ok,
    Error,
}

impl From<StatusArg> for SpanStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Ok => SpanStatus::Ok,
            StatusArg::Error => SpanStatus::Error,
        }
    }
}

/// Execute the whoami command
pub fn execute_whoami(env: &RuntimeEnv, format: OutputFormat) -> Result<ExitCode, CliError> {
    let ctx = bv_runtime::auth::require_auth(env)?;
    WhoamiOutput::from_context(&ctx).render(format)?;
    Ok(ExitCode::Success)
}

/// Execute the check command
pub fn execute_check(env: &RuntimeEnv, format: OutputFormat) -> Result<ExitCode, CliError> {
    let output = CheckOutput::from_env(env);
    output.render(format)?;

    Ok(if output.active {
        ExitCode::Success
    } else {
        ExitCode::NotAuthenticated
    })
}

/// Execute the span command
///
/// Exits successfully even when the orchestrator rejects the span.
pub fn execute_span(
    env: &RuntimeEnv,
    name: String,
    status: StatusArg,
    parent: Option<String>,
    tags: Vec<String>,
    metadata: Option<String>,
) -> Result<ExitCode, CliError> {
    let options = build_span_options(name, status, parent, tags, metadata.as_deref())?;
    require_run_context(env)?;

    let span_id = new_span_id();
    let transport = OrchestratorTransport::new(env.clone(), ClientConfig::from_env());
    let tracer = Tracer::new(env.clone(), Arc::new(transport));
    tracer.record_span(options.span_id(span_id.clone()))?;

    match env.execution_id() {
        Some(execution_id) => {
            tracing::info!(execution_id, span_id = %span_id, "Span queued, delivery is best-effort");
            println!("{}", span_id);
        }
        None => {
            tracing::warn!("BV_JOB_EXECUTION_ID is not set, span was not sent");
        }
    }

    Ok(ExitCode::Success)
}

/// Build span options from command-line arguments
pub fn build_span_options(
    name: String,
    status: StatusArg,
    parent: Option<String>,
    tags: Vec<String>,
    metadata: Option<&str>,
) -> Result<SpanOptions, CliError> {
    if name.trim().is_empty() {
        return Err(CliError::InvalidInput("span name must not be empty".to_string()));
    }

    let mut options = SpanOptions::new(name).status(status.into());
    if let Some(parent) = parent {
        options = options.parent(parent);
    }
    if !tags.is_empty() {
        options = options.tags(tags);
    }
    if let Some(raw) = metadata {
        options = options.metadata(parse_metadata(raw)?);
    }
    Ok(options)
}

fn parse_metadata(raw: &str) -> Result<Map<String, Value>, CliError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::InvalidInput(
            "--metadata must be a JSON object".to_string(),
        )),
        Err(e) => Err(CliError::InvalidInput(format!("--metadata is not valid JSON: {}", e))),
    }
}
