//! Integration tests for identity resolution
//!
//! Covers source precedence, developer credential validation, and the
//! expiry rules applied by `require_auth`.

mod common;

use bv_runtime::auth::{load_auth_context, require_auth, ROBOT_USERNAME};
use bv_runtime::{AuthError, ExecutionMode};
use chrono::{Duration, SecondsFormat, Utc};
use common::AuthDir;
use proptest::prelude::*;
use serde_json::json;

fn developer_file(expires_at: &str) -> serde_json::Value {
    json!({
        "api_url": "https://api.bv.example/",
        "ui_url": "https://app.bv.example/",
        "access_token": "dev-token",
        "expires_at": expires_at,
        "user": {"id": "17", "username": "dana"},
        "machine": {"name": "dana-laptop"}
    })
}

fn iso(offset: Duration) -> String {
    (Utc::now() + offset).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[test]
fn test_no_sources_is_not_authenticated() {
    let auth = AuthDir::new();

    let err = load_auth_context(&auth.env()).unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));

    let err = require_auth(&auth.env()).unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
}

#[test]
fn test_developer_file_with_future_expiry() {
    let auth = AuthDir::new();
    auth.write_auth_json(&developer_file(&iso(Duration::hours(2))));

    let ctx = require_auth(&auth.env()).unwrap();
    assert!(!ctx.is_expired());
    assert_eq!(ctx.api_url(), "https://api.bv.example");
    assert_eq!(ctx.ui_url(), "https://app.bv.example");
    assert_eq!(ctx.access_token(), "dev-token");
    assert_eq!(ctx.user().id, Some(17));
    assert_eq!(ctx.machine_name(), "dana-laptop");
    assert_eq!(ctx.execution_id(), None);
    assert_eq!(ctx.mode(), ExecutionMode::Developer);
}

#[test]
fn test_expired_developer_file_is_rejected() {
    let auth = AuthDir::new();
    auth.write_auth_json(&developer_file(&iso(-Duration::minutes(5))));

    // Loading alone does not check expiry.
    assert!(load_auth_context(&auth.env()).unwrap().is_expired());

    let err = require_auth(&auth.env()).unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
    assert!(err.to_string().contains("bv auth login"));
}

#[test]
fn test_expired_robot_username_in_file_is_exempt() {
    let auth = AuthDir::new();
    let mut data = developer_file(&iso(-Duration::days(30)));
    data["user"] = json!({"username": "robot:ci"});
    auth.write_auth_json(&data);

    let ctx = require_auth(&auth.env()).unwrap();
    assert!(ctx.is_expired());
}

#[test]
fn test_expired_file_without_username_is_exempt() {
    let auth = AuthDir::new();
    let mut data = developer_file(&iso(-Duration::days(2)));
    data.as_object_mut().unwrap().remove("user");
    auth.write_auth_json(&data);
    let ctx = require_auth(&auth.env()).unwrap();
    assert!(ctx.is_expired());
    assert!(ctx.user().username.is_none());

    data["user"] = json!({"id": 4, "username": ""});
    auth.write_auth_json(&data);
    let ctx = require_auth(&auth.env()).unwrap();
    assert_eq!(ctx.user().id, Some(4));
    assert!(ctx.is_expired());
}

#[test]
fn test_runner_store_takes_precedence() {
    let auth = AuthDir::new();
    auth.write_auth_json(&developer_file(&iso(-Duration::days(1))));
    auth.write_runner_row(9001, "exec-77", "http://orch.internal:8000/", "machine-token", "runner-a");

    let ctx = require_auth(&auth.env().with_pid(9001)).unwrap();
    assert_eq!(ctx.mode(), ExecutionMode::Runner);
    assert_eq!(ctx.user().username.as_deref(), Some(ROBOT_USERNAME));
    assert_eq!(ctx.execution_id(), Some("exec-77"));
    assert_eq!(ctx.api_url(), "http://orch.internal:8000");
    assert_eq!(ctx.ui_url(), ctx.api_url());
    assert_eq!(ctx.access_token(), "machine-token");
    assert!(ctx.expires_at() > Utc::now() + Duration::days(364));
}

#[test]
fn test_runner_row_for_other_pid_falls_back_to_file() {
    let auth = AuthDir::new();
    auth.write_auth_json(&developer_file(&iso(Duration::hours(1))));
    auth.write_runner_row(9001, "exec-77", "http://orch.internal:8000", "machine-token", "runner-a");

    let ctx = require_auth(&auth.env().with_pid(9002)).unwrap();
    assert_eq!(ctx.mode(), ExecutionMode::Developer);
    assert_eq!(ctx.access_token(), "dev-token");
}

#[test]
fn test_corrupt_runner_store_falls_back_to_file() {
    let auth = AuthDir::new();
    std::fs::write(auth.path().join("runner_context.db"), "garbage").unwrap();
    auth.write_auth_json(&developer_file(&iso(Duration::hours(1))));

    let ctx = require_auth(&auth.env()).unwrap();
    assert_eq!(ctx.mode(), ExecutionMode::Developer);
}

#[test]
fn test_legacy_orchestrator_url_fills_both_urls() {
    let auth = AuthDir::new();
    auth.write_auth_json(&json!({
        "orchestrator_url": "https://legacy.bv.example///",
        "access_token": "t",
        "expires_at": iso(Duration::hours(1))
    }));

    let ctx = require_auth(&auth.env()).unwrap();
    assert_eq!(ctx.api_url(), "https://legacy.bv.example");
    assert_eq!(ctx.ui_url(), "https://legacy.bv.example");
    assert_eq!(ctx.machine_name(), "<unknown>");
}

#[test]
fn test_invalid_files_surface_specific_errors() {
    let auth = AuthDir::new();

    std::fs::write(auth.path().join("auth.json"), "[1, 2]").unwrap();
    assert!(matches!(
        load_auth_context(&auth.env()).unwrap_err(),
        AuthError::InvalidAuthFile { .. }
    ));

    auth.write_auth_json(&json!({"api_url": "http://x", "ui_url": "http://x", "expires_at": "2030-01-01"}));
    assert!(matches!(
        load_auth_context(&auth.env()).unwrap_err(),
        AuthError::MissingAccessToken
    ));

    auth.write_auth_json(&json!({"api_url": "http://x", "ui_url": "http://x", "access_token": "t"}));
    assert!(matches!(
        load_auth_context(&auth.env()).unwrap_err(),
        AuthError::MissingExpiresAt
    ));

    auth.write_auth_json(&json!({
        "api_url": "http://x",
        "ui_url": "http://x",
        "access_token": "t",
        "expires_at": "soon"
    }));
    assert!(matches!(
        load_auth_context(&auth.env()).unwrap_err(),
        AuthError::InvalidExpiresAt(_)
    ));

    auth.write_auth_json(&json!({"access_token": "t", "expires_at": "2030-01-01"}));
    assert!(matches!(
        load_auth_context(&auth.env()).unwrap_err(),
        AuthError::OrchestratorUrlMissing
    ));
}

#[test]
fn test_each_resolution_is_fresh() {
    let auth = AuthDir::new();
    auth.write_auth_json(&developer_file(&iso(Duration::hours(1))));
    let first = require_auth(&auth.env()).unwrap();

    let mut data = developer_file(&iso(Duration::hours(1)));
    data["access_token"] = json!("rotated");
    auth.write_auth_json(&data);
    let second = require_auth(&auth.env()).unwrap();

    assert_eq!(first.access_token(), "dev-token");
    assert_eq!(second.access_token(), "rotated");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn future_expiry_always_accepted(minutes in 1i64..525_600) {
        let auth = AuthDir::new();
        auth.write_auth_json(&developer_file(&iso(Duration::minutes(minutes))));

        let ctx = require_auth(&auth.env()).unwrap();
        prop_assert!(!ctx.is_expired());
    }

    #[test]
    fn past_expiry_always_rejected(minutes in 1i64..525_600) {
        let auth = AuthDir::new();
        auth.write_auth_json(&developer_file(&iso(-Duration::minutes(minutes))));

        prop_assert!(matches!(require_auth(&auth.env()), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn runner_context_never_expires(pid in 1u32..4_000_000) {
        let auth = AuthDir::new();
        auth.write_runner_row(pid, "exec-p", "http://orch", "tok", "m");

        let ctx = require_auth(&auth.env().with_pid(pid)).unwrap();
        prop_assert!(ctx.user().is_robot());
        prop_assert!(!ctx.is_expired());
    }
}
