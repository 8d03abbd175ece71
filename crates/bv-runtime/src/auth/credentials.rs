//! Developer credential file
//!
//! `bv auth login` persists the developer's session to `auth.json` in the
//! auth directory. Two schemas are accepted:
//!
//! - **Current**: separate `api_url` and `ui_url`
//! - **Deprecated**: a single `orchestrator_url`, applied to whichever of
//!   the two URLs is missing
//!
//! Unlike the runner store, this source is authoritative: a missing file
//! means the process is not authenticated at all, and every shape problem
//! is reported with its own error.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use super::chain::IdentitySource;
use super::context::{AuthContext, AuthUser};
use super::{normalize_base_url, parse_iso8601, UNKNOWN_MACHINE};
use crate::env::RuntimeEnv;
use crate::error::{AuthError, AuthResult};

/// The `auth.json` credential written by the login flow
#[derive(Debug, Clone)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    /// Credential file at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `auth.json` inside the snapshot's auth directory
    pub fn for_env(env: &RuntimeEnv) -> Self {
        Self::new(env.auth_file_path())
    }

    /// Location of the credential file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file is present on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and validate the credential file
    pub fn load(&self) -> AuthResult<AuthContext> {
        if !self.path.exists() {
            return Err(AuthError::NotAuthenticated);
        }

        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| AuthError::invalid_file(&self.path, e))?;
        let data: Value =
            serde_json::from_str(&raw).map_err(|e| AuthError::invalid_file(&self.path, e))?;

        parse_credentials(&self.path, &data)
    }
}

impl IdentitySource for CredentialFile {
    fn name(&self) -> &str {
        "credential-file"
    }

    fn resolve(&self) -> AuthResult<Option<AuthContext>> {
        self.load().map(Some)
    }
}

/// Build a developer context from parsed `auth.json` content
pub fn parse_credentials(path: &Path, data: &Value) -> AuthResult<AuthContext> {
    let data = data
        .as_object()
        .ok_or_else(|| AuthError::invalid_file(path, "expected JSON object"))?;

    let legacy_url = present(data.get("orchestrator_url"));
    let api_url_raw = present(data.get("api_url")).or(legacy_url);
    let ui_url_raw = present(data.get("ui_url")).or(legacy_url);

    let api_url = normalize_base_url(&truthy_text(api_url_raw))?;
    let ui_url = normalize_base_url(&truthy_text(ui_url_raw))?;

    let access_token = truthy_text(data.get("access_token")).trim().to_string();
    if access_token.is_empty() {
        return Err(AuthError::MissingAccessToken);
    }

    let expires_raw = truthy_text(data.get("expires_at"));
    let expires_raw = expires_raw.trim();
    if expires_raw.is_empty() {
        return Err(AuthError::MissingExpiresAt);
    }
    let expires_at = parse_iso8601(expires_raw).map_err(AuthError::InvalidExpiresAt)?;

    let empty = Map::new();
    let user = data.get("user").and_then(Value::as_object).unwrap_or(&empty);

    Ok(AuthContext {
        api_url,
        ui_url,
        access_token: Zeroizing::new(access_token),
        expires_at,
        user: AuthUser {
            id: present(user.get("id")).and_then(coerce_user_id),
            username: present(user.get("username")).map(text),
        },
        machine_name: machine_name(data),
        execution_id: None,
    })
}

/// Top-level `machine_name`, else nested `machine.name`
fn machine_name(data: &Map<String, Value>) -> String {
    let raw = present(data.get("machine_name")).or_else(|| {
        data.get("machine")
            .and_then(Value::as_object)
            .and_then(|m| present(m.get("name")))
    });

    let name = raw.map(text).unwrap_or_default();
    match name.trim() {
        "" => UNKNOWN_MACHINE.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Integer coercion for `user.id`; anything unparseable is treated as absent
fn coerce_user_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().replace('_', "").parse().ok(),
        _ => None,
    }
}

/// A value is present unless missing or JSON `null`
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Render a JSON scalar as text
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Drop missing, null, false, zero and empty values
fn truthy(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null | Value::Bool(false) => false,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(true) => true,
    })
}

/// Text of a value, with falsy values collapsing to ""
fn truthy_text(value: Option<&Value>) -> String {
    truthy(value).map(text).unwrap_or_default()
}
