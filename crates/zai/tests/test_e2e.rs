//! End-to-end tests: config on disk, agents launched as real subprocesses

#![cfg(unix)]

mod common;

use common::TestEnv;
use predicates::prelude::*;
use serde_json::Value;
use serial_test::serial;
use std::time::{Duration, Instant};

fn delegate(env: &TestEnv, agent: &str, query: &str) -> Value {
    let output = env
        .command()
        .args(["delegate", agent, query])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap()
}

/// init, then status, then the default agent list
#[test]
fn test_full_workflow_init_status_agents() {
    let env = TestEnv::default();

    env.command().arg("init").assert().success();

    env.command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK]"))
        .stdout(predicate::str::contains("Delegates: 1 configured"));

    env.command()
        .arg("agents")
        .assert()
        .success()
        .stdout(predicate::str::contains("model_agent [ready]"));
}

#[test]
#[serial]
fn test_delegate_passes_structured_envelope_through() {
    let env = TestEnv::default();
    let script = env
        .agent_script(
            "invest.sh",
            r#"echo '{"success": true, "response": "EBITDA is earnings before interest..."}'"#,
        )
        .unwrap();
    env.create_subprocess_config("investment_agent", &script, 30)
        .unwrap();

    let envelope = delegate(&env, "investment_agent", "What is EBITDA?");
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["response"], "EBITDA is earnings before interest...");
    assert!(envelope.get("error").is_none());
}

#[test]
#[serial]
fn test_delegate_wraps_plain_text() {
    let env = TestEnv::default();
    let script = env
        .agent_script("plain.sh", r#"printf 'answer to: %s' "$1""#)
        .unwrap();
    env.create_subprocess_config("plain_agent", &script, 30)
        .unwrap();

    let envelope = delegate(&env, "plain_agent", "Что такое P/E ratio?");
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["response"], "answer to: Что такое P/E ratio?");
}

#[test]
#[serial]
fn test_delegate_timeout() {
    let env = TestEnv::default();
    let script = env.agent_script("slow.sh", "exec sleep 30").unwrap();
    env.create_subprocess_config("slow_agent", &script, 1).unwrap();

    let started = Instant::now();
    let envelope = delegate(&env, "slow_agent", "Analyse my portfolio");

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(envelope["success"], false);
    assert!(envelope["response"]
        .as_str()
        .unwrap()
        .contains("did not respond in time"));
}

#[test]
#[serial]
fn test_delegate_failed_agent_repeats_same_error() {
    let env = TestEnv::default();
    let missing = env.temp_dir.path().join("gone.sh");
    env.create_subprocess_config("gone_agent", &missing, 5).unwrap();

    let first = delegate(&env, "gone_agent", "q1");
    let second = delegate(&env, "gone_agent", "q2");

    assert_eq!(first["success"], false);
    assert_eq!(first["error"], second["error"]);
    assert!(first["error"]
        .as_str()
        .unwrap()
        .starts_with("launcher script not found"));
}
