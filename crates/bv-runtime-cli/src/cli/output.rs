//! Output formatting for the diagnostics CLI

use bv_runtime::auth::has_runner_context;
use bv_runtime::{is_run_context, AuthContext, ExecutionMode, RuntimeEnv};
use chrono::SecondsFormat;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use crate::error::CliError;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON for scripts
    Json,
}

/// Resolved identity, without the access token
#[derive(Debug, Clone, Serialize)]
pub struct WhoamiOutput {
    pub mode: ExecutionMode,
    pub api_url: String,
    pub ui_url: String,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub machine_name: String,
    pub execution_id: Option<String>,
    pub expires_at: String,
}

impl WhoamiOutput {
    pub fn from_context(ctx: &AuthContext) -> Self {
        Self {
            mode: ctx.mode(),
            api_url: ctx.api_url().to_string(),
            ui_url: ctx.ui_url().to_string(),
            user_id: ctx.user().id,
            username: ctx.user().username.clone(),
            machine_name: ctx.machine_name().to_string(),
            execution_id: ctx.execution_id().map(str::to_string),
            expires_at: ctx.expires_at().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<(), CliError> {
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(self)?);
            }
            OutputFormat::Text => {
                let mut stdout = io::stdout();
                writeln!(stdout, "{}", "Authenticated".green().bold()).ok();
                writeln!(stdout, "  mode:      {}", self.mode).ok();
                writeln!(stdout, "  api:       {}", self.api_url).ok();
                writeln!(stdout, "  ui:        {}", self.ui_url).ok();
                writeln!(stdout, "  user:      {}", self.user_label()).ok();
                writeln!(stdout, "  machine:   {}", self.machine_name).ok();
                if let Some(execution_id) = &self.execution_id {
                    writeln!(stdout, "  execution: {}", execution_id).ok();
                }
                writeln!(stdout, "  expires:   {}", self.expires_at.dimmed()).ok();
                stdout.flush().ok();
            }
        }
        Ok(())
    }

    fn user_label(&self) -> String {
        match (&self.username, self.user_id) {
            (Some(name), Some(id)) => format!("{} (id {})", name, id),
            (Some(name), None) => name.clone(),
            (None, Some(id)) => format!("id {}", id),
            (None, None) => "-".to_string(),
        }
    }
}

/// Activation state of the runtime for this process
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput {
    pub active: bool,
    pub sdk_run: bool,
    pub runner_context: bool,
    pub execution_id: Option<String>,
    pub pid: u32,
}

impl CheckOutput {
    pub fn from_env(env: &RuntimeEnv) -> Self {
        Self {
            active: is_run_context(env),
            sdk_run: env.sdk_run(),
            runner_context: has_runner_context(env),
            execution_id: env.execution_id().map(str::to_string),
            pid: env.pid(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<(), CliError> {
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(self)?);
            }
            OutputFormat::Text => {
                let mut stdout = io::stdout();
                if self.active {
                    writeln!(stdout, "{} runtime active", "+".green()).ok();
                } else {
                    writeln!(stdout, "{} runtime inactive", "x".red()).ok();
                }
                writeln!(stdout, "  bv run marker:  {}", yes_no(self.sdk_run)).ok();
                writeln!(stdout, "  runner context: {} (pid {})", yes_no(self.runner_context), self.pid).ok();
                writeln!(
                    stdout,
                    "  execution id:   {}",
                    self.execution_id.as_deref().unwrap_or("-")
                )
                .ok();
                stdout.flush().ok();
            }
        }
        Ok(())
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
