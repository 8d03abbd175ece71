//! Shared fixtures for bv-runtime integration tests

#![allow(dead_code)]

use bv_runtime::{ClientError, RuntimeEnv, SpanBatch, SpanTransport};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Isolated auth directory with helpers to seed both identity sources
pub struct AuthDir {
    pub dir: TempDir,
}

impl AuthDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp auth dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Snapshot with no markers, pointed at this directory
    pub fn env(&self) -> RuntimeEnv {
        RuntimeEnv::from_vars(Vec::<(String, String)>::new()).with_auth_dir(self.path())
    }

    pub fn write_auth_json(&self, data: &Value) {
        std::fs::write(self.path().join("auth.json"), data.to_string()).expect("write auth.json");
    }

    pub fn write_runner_row(&self, pid: u32, execution_id: &str, api_url: &str, token: &str, machine: &str) {
        let conn = Connection::open(self.path().join("runner_context.db")).expect("open runner db");
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS runner_context (
                pid INTEGER PRIMARY KEY,
                execution_id TEXT,
                api_url TEXT,
                access_token TEXT,
                machine_name TEXT
            );",
        )
        .expect("create runner_context");
        conn.execute(
            "INSERT OR REPLACE INTO runner_context VALUES (?1, ?2, ?3, ?4, ?5)",
            params![pid, execution_id, api_url, token, machine],
        )
        .expect("insert runner row");
    }
}

/// Transport that keeps every batch it is handed
#[derive(Default)]
pub struct RecordingTransport {
    batches: Mutex<Vec<SpanBatch>>,
}

impl RecordingTransport {
    pub fn batches(&self) -> Vec<SpanBatch> {
        self.batches.lock().unwrap().clone()
    }
}

impl SpanTransport for RecordingTransport {
    fn send_spans(&self, batch: &SpanBatch) -> Result<(), ClientError> {
        self.batches.lock().unwrap().push(batch.clone());
        Ok(())
    }
}
