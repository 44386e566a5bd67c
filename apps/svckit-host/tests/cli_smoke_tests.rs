#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the svckit-host binary.

use std::process::{Command, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::timeout;

const COMPONENT_ENV: [&str; 6] = [
    "SERVICE_NAME",
    "JAEGER_GRPC_ADDR",
    "JAEGER_HTTP_ADDR",
    "METRICS_ADDR",
    "HEALTH_CHECK_ADDR",
    "LOG_LEVEL",
];

/// Run the binary with a clean component environment plus `envs`.
fn run_svckit_host(args: &[&str], envs: &[(&str, &str)]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_svckit-host"));
    for key in COMPONENT_ENV {
        cmd.env_remove(key);
    }
    cmd.args(args)
        .envs(envs.iter().copied())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute svckit-host")
}

fn printed_config(args: &[&str], envs: &[(&str, &str)]) -> serde_json::Value {
    let output = run_svckit_host(args, envs);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--print-config should emit JSON")
}

#[test]
fn test_missing_service_name_fails() {
    let output = run_svckit_host(&[], &[]);

    assert!(!output.status.success(), "Bootstrap without a name must fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("service name not set or empty string"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_empty_service_name_fails() {
    let output = run_svckit_host(&[], &[("SERVICE_NAME", "")]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("service name not set or empty string"));
}

#[test]
fn test_print_config_shows_defaults() {
    let config = printed_config(&["--print-config"], &[]);

    assert_eq!(config["service_name"], "");
    assert_eq!(config["jaeger_grpc_addr"], "0.0.0.0:4317");
    assert_eq!(config["jaeger_http_addr"], "0.0.0.0:4318");
    assert_eq!(config["metrics_addr"], "0.0.0.0:9101");
    assert!(config["health_check_addr"].is_null());
    assert!(config["log_level"].is_null());
}

#[test]
fn test_print_config_reads_environment() {
    let config = printed_config(
        &["--print-config"],
        &[
            ("SERVICE_NAME", "orders-api"),
            ("HEALTH_CHECK_ADDR", "127.0.0.1:8081"),
            ("LOG_LEVEL", "warn"),
        ],
    );

    assert_eq!(config["service_name"], "orders-api");
    assert_eq!(config["health_check_addr"], "127.0.0.1:8081");
    assert_eq!(config["log_level"], "warn");
}

#[test]
fn test_log_level_flag_overrides_environment() {
    let config = printed_config(
        &["--print-config", "--log-level", "debug"],
        &[("LOG_LEVEL", "warn")],
    );

    assert_eq!(config["log_level"], "debug");
}

#[cfg(unix)]
#[tokio::test]
async fn test_sigterm_shuts_down_cleanly() {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_svckit-host"));
    for key in COMPONENT_ENV {
        cmd.env_remove(key);
    }
    cmd.envs([
        ("SERVICE_NAME", "orders-api"),
        ("JAEGER_GRPC_ADDR", ""),
        ("JAEGER_HTTP_ADDR", ""),
        ("METRICS_ADDR", "127.0.0.1:0"),
        ("HEALTH_CHECK_ADDR", "127.0.0.1:0"),
    ])
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    let mut child = cmd.spawn().unwrap();
    let mut lines = BufReader::new(child.stdout.take().unwrap()).lines();

    let started = timeout(Duration::from_secs(30), async {
        while let Some(line) = lines.next_line().await.unwrap() {
            if line.contains("svckit-host started") {
                return true;
            }
        }
        false
    })
    .await
    .expect("host did not start in time");
    assert!(started, "host exited before logging startup");

    // Signal handlers are installed right after the startup line.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let pid = child.id().unwrap().to_string();
    let killed = Command::new("kill").args(["-TERM", &pid]).status().unwrap();
    assert!(killed.success());

    let mut rest = Vec::new();
    timeout(Duration::from_secs(30), async {
        while let Some(line) = lines.next_line().await.unwrap() {
            rest.push(line);
        }
    })
    .await
    .expect("host did not stop in time");

    let status = child.wait().await.unwrap();
    assert!(status.success(), "exit status: {status}");
    assert!(
        rest.iter().any(|line| line.contains("core shut down")),
        "stdout after SIGTERM: {rest:?}"
    );
}
