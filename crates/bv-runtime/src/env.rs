//! Environment snapshot and client configuration
//!
//! Every decision the runtime makes (where credentials live, whether the
//! guard is satisfied, which execution a span belongs to) is taken from a
//! [`RuntimeEnv`] value rather than by reading process globals ad hoc. The
//! convenience entry points capture one with [`RuntimeEnv::from_env`]; tests
//! and embedders build one explicitly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Overrides the directory holding `auth.json` and `runner_context.db`
pub const AUTH_DIR_VAR: &str = "BV_AUTH_DIR";

/// Set to `1` by `bv run` for SDK-launched processes
pub const SDK_RUN_VAR: &str = "BV_SDK_RUN";

/// Execution id assigned by the runner; spans are attributed to it
pub const EXECUTION_ID_VAR: &str = "BV_JOB_EXECUTION_ID";

/// Request timeout for the orchestrator client, in milliseconds
pub const HTTP_TIMEOUT_VAR: &str = "BV_HTTP_TIMEOUT_MS";

const DEFAULT_DIR_NAME: &str = ".bv";
const AUTH_FILE_NAME: &str = "auth.json";
const RUNNER_DB_NAME: &str = "runner_context.db";

/// Snapshot of the process inputs the runtime depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnv {
    auth_dir_override: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    sdk_run: bool,
    execution_id: Option<String>,
    pid: u32,
}

impl RuntimeEnv {
    /// Capture the live process environment
    pub fn from_env() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::from_vars(vars)
            .with_home_dir(dirs::home_dir())
            .with_pid(std::process::id())
    }

    /// Build a snapshot from explicit variables
    ///
    /// The home directory is left unset and the pid is the current process
    /// id; adjust them with the `with_*` methods.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self {
            auth_dir_override: vars
                .get(AUTH_DIR_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            home_dir: None,
            sdk_run: vars.get(SDK_RUN_VAR).map(|v| v == "1").unwrap_or(false),
            execution_id: vars.get(EXECUTION_ID_VAR).filter(|v| !v.is_empty()).cloned(),
            pid: std::process::id(),
        }
    }

    pub fn with_auth_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.auth_dir_override = Some(dir.into());
        self
    }

    pub fn with_home_dir(mut self, home: Option<PathBuf>) -> Self {
        self.home_dir = home;
        self
    }

    pub fn with_sdk_run(mut self, sdk_run: bool) -> Self {
        self.sdk_run = sdk_run;
        self
    }

    pub fn with_execution_id(mut self, execution_id: Option<impl Into<String>>) -> Self {
        self.execution_id = execution_id.map(Into::into).filter(|id: &String| !id.is_empty());
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    /// Whether the `bv run` marker is present
    pub fn sdk_run(&self) -> bool {
        self.sdk_run
    }

    pub fn execution_id(&self) -> Option<&str> {
        self.execution_id.as_deref()
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Directory holding the credential file and the runner store
    ///
    /// `BV_AUTH_DIR` wins when set (with `~` expanded); otherwise `~/.bv`.
    pub fn auth_dir(&self) -> PathBuf {
        let dir = match &self.auth_dir_override {
            Some(dir) => expand_home(dir, self.home_dir.as_deref()),
            None => self
                .home_dir
                .as_deref()
                .map(|home| home.join(DEFAULT_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME)),
        };
        resolve(dir)
    }

    pub fn auth_file_path(&self) -> PathBuf {
        self.auth_dir().join(AUTH_FILE_NAME)
    }

    pub fn runner_db_path(&self) -> PathBuf {
        self.auth_dir().join(RUNNER_DB_NAME)
    }
}

fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Make `path` absolute, resolving symlinks when it exists
fn resolve(path: PathBuf) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(&path) {
        return canonical;
    }
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}

/// Configuration for the orchestrator HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: format!("bv-runtime/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout_ms: std::env::var(HTTP_TIMEOUT_VAR)
                .map(|v| v.trim().parse().unwrap_or(defaults.timeout_ms))
                .unwrap_or(defaults.timeout_ms),
            ..defaults
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_reads_markers() {
        let env = RuntimeEnv::from_vars([
            (SDK_RUN_VAR, "1"),
            (EXECUTION_ID_VAR, "exec-7"),
        ]);

        assert!(env.sdk_run());
        assert_eq!(env.execution_id(), Some("exec-7"));
    }

    #[test]
    fn test_sdk_run_requires_exact_marker() {
        for value in ["0", "true", "yes", ""] {
            let env = RuntimeEnv::from_vars([(SDK_RUN_VAR, value)]);
            assert!(!env.sdk_run(), "{value:?} should not enable the marker");
        }
    }

    #[test]
    fn test_empty_execution_id_is_absent() {
        let env = RuntimeEnv::from_vars([(EXECUTION_ID_VAR, "")]);
        assert_eq!(env.execution_id(), None);

        let env = env.with_execution_id(Some(""));
        assert_eq!(env.execution_id(), None);
    }

    #[test]
    fn test_default_auth_dir_under_home() {
        let home = tempfile::tempdir().unwrap();
        let env = RuntimeEnv::from_vars(Vec::<(String, String)>::new())
            .with_home_dir(Some(home.path().to_path_buf()));

        assert_eq!(env.auth_dir(), home.path().join(".bv"));
        assert_eq!(env.auth_file_path(), home.path().join(".bv").join("auth.json"));
    }

    #[test]
    fn test_override_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        let env = RuntimeEnv::from_vars([(AUTH_DIR_VAR, dir.path().to_str().unwrap())])
            .with_home_dir(Some(PathBuf::from("/nonexistent-home")));

        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(env.auth_dir(), expected);
        assert_eq!(env.runner_db_path(), expected.join("runner_context.db"));
    }

    #[test]
    fn test_override_expands_tilde() {
        let env = RuntimeEnv::from_vars([(AUTH_DIR_VAR, "~/custom-bv")])
            .with_home_dir(Some(PathBuf::from("/home/dev")));

        assert_eq!(env.auth_dir(), PathBuf::from("/home/dev/custom-bv"));
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default().with_timeout_ms(250);
        assert_eq!(config.timeout_ms, 250);
        assert!(config.user_agent.starts_with("bv-runtime/"));
    }
}
