//! End-to-end tests of the aws-init binary. No test here reaches AWS.

use assert_cmd::Command;
use predicates::prelude::*;

/// Binary with a minimal, reference-free environment.
fn aws_init() -> Command {
    let mut cmd = Command::cargo_bin("aws-init").unwrap();
    cmd.env_clear()
        .env("PATH", "/usr/bin:/bin")
        .env("AWS_EC2_METADATA_DISABLED", "true");
    cmd
}

#[test]
fn test_version_flags() {
    for flag in ["-v", "--version"] {
        aws_init()
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "aws-init {}",
                env!("CARGO_PKG_VERSION")
            )));
    }
}

#[test]
fn test_short_h_runs_health_check() {
    // No credentials and no metadata service, so STS cannot succeed
    aws_init()
        .arg("-h")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("health check passed").not())
        .stdout(predicate::str::contains("Usage").not())
        .stderr(predicate::str::contains("Health check failed"));
}

#[test]
fn test_long_help_prints_usage() {
    aws_init()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--health"));
}

#[test]
fn test_missing_command_is_usage_error() {
    aws_init()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("COMMAND"));
}

#[test]
fn test_exit_code_passthrough() {
    aws_init().args(["sh", "-c", "exit 42"]).assert().code(42);
    aws_init().arg("true").assert().success();
}

#[test]
fn test_command_not_found() {
    aws_init()
        .arg("nonexistent-command-12345")
        .assert()
        .code(1);
}

#[test]
fn test_environment_without_references_passes_through() {
    aws_init()
        .env("GREETING", "hello=world")
        .args(["sh", "-c", r#"printf %s "$GREETING""#])
        .assert()
        .success()
        .stdout("hello=world");
}

#[test]
fn test_invalid_reference_aborts_before_command() {
    aws_init()
        .env("AWS_REGION", "us-east-1")
        .env("BAD", "aws-secret:")
        .args(["sh", "-c", "echo started"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("started").not())
        .stderr(predicate::str::contains("BAD"));
}

#[test]
fn test_missing_region_aborts_before_command() {
    aws_init()
        .env("DB_PASSWORD", "aws-secret:prod/db#password")
        .args(["sh", "-c", "echo started"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("started").not())
        .stderr(predicate::str::contains("region"));
}

#[test]
fn test_json_log_format_from_env() {
    aws_init()
        .env("AWS_INIT_LOG_FORMAT", "json")
        .env("AWS_INIT_LOG_LEVEL", "debug")
        .arg("true")
        .assert()
        .success()
        .stderr(predicate::str::contains("Tracing initialized for aws-init"))
        .stderr(predicate::str::contains("correlation_id"));
}

#[test]
fn test_error_level_silences_info() {
    aws_init()
        .args(["--log-level", "error", "true"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Started command").not());
}
