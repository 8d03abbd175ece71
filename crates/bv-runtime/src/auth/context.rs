//! Resolved authentication context.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use zeroize::Zeroizing;

use super::runner::RunnerRecord;
use super::{normalize_base_url, UNKNOWN_MACHINE};
use crate::error::AuthResult;

/// Username assigned to identities issued by the runner
pub const ROBOT_USERNAME: &str = "robot:runner";

/// Prefix marking machine identities
pub const ROBOT_PREFIX: &str = "robot:";

/// Validity window given to runner-issued contexts
pub const RUNNER_TOKEN_TTL_DAYS: i64 = 365;

/// The user an execution runs as
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: Option<i64>,
    pub username: Option<String>,
}

impl AuthUser {
    /// The identity runner-launched executions run as
    pub fn robot() -> Self {
        Self {
            id: None,
            username: Some(ROBOT_USERNAME.to_string()),
        }
    }

    /// Machine identities are exempt from credential expiry checks
    pub fn is_robot(&self) -> bool {
        self.username
            .as_deref()
            .map(|name| name.starts_with(ROBOT_PREFIX))
            .unwrap_or(false)
    }

    /// Only named, non-machine users have their credential expiry enforced
    pub fn enforces_expiry(&self) -> bool {
        matches!(self.username.as_deref(), Some(name) if !name.is_empty() && !name.starts_with(ROBOT_PREFIX))
    }
}

/// Which identity source produced a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Runner,
    Developer,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Runner => write!(f, "runner"),
            ExecutionMode::Developer => write!(f, "developer"),
        }
    }
}

/// Immutable identity of the running process
///
/// Built fresh by every resolution call. The access token is wiped from
/// memory when the context is dropped and never appears in `Debug` output.
#[derive(Clone)]
pub struct AuthContext {
    pub(crate) api_url: String,
    pub(crate) ui_url: String,
    pub(crate) access_token: Zeroizing<String>,
    pub(crate) expires_at: DateTime<Utc>,
    pub(crate) user: AuthUser,
    pub(crate) machine_name: String,
    pub(crate) execution_id: Option<String>,
}

impl AuthContext {
    /// Synthesize a context from a runner store row
    pub(crate) fn from_runner(record: RunnerRecord, now: DateTime<Utc>) -> AuthResult<Self> {
        let api_url = normalize_base_url(&record.api_url)?;
        let machine_name = match record.machine_name.trim() {
            "" => UNKNOWN_MACHINE.to_string(),
            _ => record.machine_name,
        };

        Ok(Self {
            ui_url: api_url.clone(),
            api_url,
            access_token: Zeroizing::new(record.access_token),
            expires_at: now + Duration::days(RUNNER_TOKEN_TTL_DAYS),
            user: AuthUser::robot(),
            machine_name,
            execution_id: record.execution_id,
        })
    }

    /// Orchestrator base URL, without trailing slash
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Web UI base URL; equals `api_url` for runner identities
    pub fn ui_url(&self) -> &str {
        &self.ui_url
    }

    /// Bearer token for orchestrator requests
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// When the access token stops being valid
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// The user this execution runs as
    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    /// Host that launched the execution, or `<unknown>`
    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    /// Execution id, only known to runner-issued contexts
    pub fn execution_id(&self) -> Option<&str> {
        self.execution_id.as_deref()
    }

    /// Runner for machine identities, developer otherwise
    pub fn mode(&self) -> ExecutionMode {
        if self.user.is_robot() {
            ExecutionMode::Runner
        } else {
            ExecutionMode::Developer
        }
    }

    /// Whether the token has expired as of now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// A context is expired from the instant `expires_at` is reached
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("Bearer {}", self.access_token.as_str()))
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("api_url", &self.api_url)
            .field("ui_url", &self.ui_url)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .field("machine_name", &self.machine_name)
            .field("execution_id", &self.execution_id)
            .finish()
    }
}
