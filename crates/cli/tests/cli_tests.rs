//! CLI integration tests

use std::io::Write;
use std::process::Command;

fn ddu(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "ddu-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn activation_file(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(body.as_bytes()).expect("Failed to write config");
    file
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = ddu(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("DDU spike root-cause analysis"), "Should show about text");
    assert!(stdout.contains("check"), "Should show check command");
    assert!(stdout.contains("problems"), "Should show problems command");
    assert!(stdout.contains("analyze"), "Should show analyze command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = ddu(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("ddu"), "Should show binary name");
}

/// Test analyze subcommand help
#[test]
fn test_analyze_help() {
    let output = ddu(&["analyze", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "analyze help should succeed");
    assert!(stdout.contains("--post"), "Should show --post option");
    assert!(stdout.contains("--endpoint"), "Should show --endpoint option");
}

/// Test check reports valid and invalid entries as JSON
#[test]
fn test_check_json_output() {
    let file = activation_file(
        r#"{"endpoints": [
            {"environment_url": "https://abc.live.dynatrace.com", "api_token": "t", "problem_text": "DDU", "datapoint_delta_threshold": 100},
            {"environment_url": "https://def.live.dynatrace.com", "api_token": "t", "problem_text": "DDU"}
        ]}"#,
    );
    let path = file.path().to_string_lossy().to_string();

    let output = ddu(&["--config", &path, "--format", "json", "check"]);
    assert!(output.status.success(), "check should succeed");

    let rows: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("check should print JSON");
    assert_eq!(rows[0]["valid"], true);
    assert_eq!(rows[1]["valid"], false);
    assert!(rows[1]["status"]
        .as_str()
        .unwrap()
        .contains("datapoint_delta_threshold"));
}

/// Test a missing config file fails
#[test]
fn test_missing_config_fails() {
    let output = ddu(&["--config", "/nonexistent/activation.json", "check"]);

    assert!(!output.status.success(), "missing config should fail");
}

/// Test an out-of-range endpoint index fails before any request
#[test]
fn test_problems_unknown_endpoint_fails() {
    let file = activation_file(
        r#"{"endpoints": [
            {"environment_url": "https://abc.live.dynatrace.com", "api_token": "t", "problem_text": "DDU", "datapoint_delta_threshold": 100}
        ]}"#,
    );
    let path = file.path().to_string_lossy().to_string();

    let output = ddu(&["--config", &path, "problems", "--endpoint", "3"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("No endpoint with index 3"));
}

fn two_endpoints(healthy_url: &str) -> tempfile::NamedTempFile {
    activation_file(&format!(
        r#"{{"endpoints": [
            {{"environment_url": "{}", "api_token": "t", "problem_text": "DDU", "datapoint_delta_threshold": 100}},
            {{"environment_url": "http://127.0.0.1:9", "api_token": "t", "problem_text": "DDU", "datapoint_delta_threshold": 100}}
        ]}}"#,
        healthy_url
    ))
}

/// Test a failing endpoint does not hide the results of a healthy one
#[test]
fn test_analyze_reports_healthy_endpoint_when_another_fails() {
    let mut server = mockito::Server::new();
    let _problems = server
        .mock("GET", "/api/v2/problems")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"problems": []}"#)
        .create();
    let file = two_endpoints(&server.url());
    let path = file.path().to_string_lossy().to_string();

    let output = ddu(&["--config", &path, "--format", "json", "analyze"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "a failed endpoint should fail the command");
    assert!(stderr.contains("1 of 2 endpoints failed"));

    let results: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("analyze should print JSON");
    assert_eq!(results.as_array().unwrap().len(), 2);
    assert_eq!(results[0]["environment_url"], server.url());
    assert!(results[0].get("error").is_none());
    assert_eq!(results[0]["problems"], serde_json::json!([]));
    assert!(results[1]["error"]
        .as_str()
        .unwrap()
        .contains("Transport failure"));
}

/// Test problems keeps listing after an unreachable endpoint
#[test]
fn test_problems_reports_every_endpoint() {
    let mut server = mockito::Server::new();
    let _problems = server
        .mock("GET", "/api/v2/problems")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"problems": [{"problemId": "p-1", "displayId": "P-1", "recentComments": {"totalCount": 0}}]}"#,
        )
        .create();
    let file = two_endpoints(&server.url());
    let path = file.path().to_string_lossy().to_string();

    let output = ddu(&["--config", &path, "--format", "json", "problems"]);

    assert!(!output.status.success());
    let results: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("problems should print JSON");
    assert_eq!(results[0]["problems"][0]["problem_id"], "p-1");
    assert!(results[1]["error"].is_string());
}
