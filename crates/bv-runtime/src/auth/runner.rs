//! Runner context store
//!
//! The BV runner records, for every process it launches, the execution id
//! and machine credentials in a small SQLite database keyed by OS process
//! id. This module performs the read-only lookup for the current process.
//!
//! The store is never authoritative: a missing file, a missing table, a
//! corrupt database or a missing row all mean "no runner context", and the
//! resolver moves on to the developer credential file.

use chrono::Utc;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

use super::chain::IdentitySource;
use super::context::AuthContext;
use crate::env::RuntimeEnv;
use crate::error::AuthResult;

const RUNNER_CONTEXT_QUERY: &str =
    "SELECT execution_id, api_url, access_token, machine_name FROM runner_context WHERE pid = ?1";

/// One row of the `runner_context` table, coerced to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerRecord {
    pub execution_id: Option<String>,
    pub api_url: String,
    pub access_token: String,
    pub machine_name: String,
}

/// Read-only view of the runner's SQLite store for one process
#[derive(Debug, Clone)]
pub struct RunnerStore {
    path: PathBuf,
    pid: u32,
}

impl RunnerStore {
    /// Store at `path`, looked up for process `pid`
    pub fn new(path: impl Into<PathBuf>, pid: u32) -> Self {
        Self {
            path: path.into(),
            pid,
        }
    }

    /// Store location and process id taken from the environment snapshot
    pub fn for_env(env: &RuntimeEnv) -> Self {
        Self::new(env.runner_db_path(), env.pid())
    }

    /// Location of the SQLite file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the row for this process, downgrading every failure to `None`
    pub fn lookup(&self) -> Option<RunnerRecord> {
        if !self.path.exists() {
            return None;
        }

        match self.query() {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    pid = self.pid,
                    error = %e,
                    "Runner context store unreadable, ignoring"
                );
                None
            }
        }
    }

    fn query(&self) -> rusqlite::Result<Option<RunnerRecord>> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // The connection is closed when `conn` goes out of scope.
        conn.query_row(RUNNER_CONTEXT_QUERY, [i64::from(self.pid)], |row| {
            Ok(RunnerRecord {
                execution_id: value_to_text(row.get_ref(0)?),
                api_url: value_to_text(row.get_ref(1)?).unwrap_or_default(),
                access_token: value_to_text(row.get_ref(2)?).unwrap_or_default(),
                machine_name: value_to_text(row.get_ref(3)?).unwrap_or_default(),
            })
        })
        .optional()
    }
}

/// Whether the runner store has a row for the snapshot's process
pub fn has_runner_context(env: &RuntimeEnv) -> bool {
    RunnerStore::for_env(env).lookup().is_some()
}

impl IdentitySource for RunnerStore {
    fn name(&self) -> &str {
        "runner"
    }

    fn resolve(&self) -> AuthResult<Option<AuthContext>> {
        match self.lookup() {
            Some(record) => AuthContext::from_runner(record, Utc::now()).map(Some),
            None => Ok(None),
        }
    }
}

fn value_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
