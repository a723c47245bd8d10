//! Integration tests for the `deploykit` binary's argument surface (spec
//! §6). These exercise only the argument-validation path — no live cluster
//! is required since the Kubernetes client is constructed after clap and
//! strategy-override parsing have already succeeded or failed.

use std::process::Command;

fn deploykit(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_deploykit"))
        .args(args)
        .output()
        .expect("failed to execute deploykit")
}

#[test]
fn missing_required_template_paths_is_a_usage_error() {
    let output = deploykit(&["--context", "kind-test"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("template-paths") || stderr.contains("required"));
}

#[test]
fn malformed_deploy_strategy_override_is_rejected_before_touching_the_cluster() {
    let output = deploykit(&[
        "--context",
        "kind-test",
        "--template-paths",
        "/nonexistent",
        "--deploy-strategy",
        "ClusterRoleWithoutEquals",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("kind=strategy"));
}

#[test]
fn unknown_deploy_strategy_value_is_rejected() {
    let output = deploykit(&[
        "--context",
        "kind-test",
        "--template-paths",
        "/nonexistent",
        "--deploy-strategy",
        "ClusterRole=Merge",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown deploy strategy"));
}

#[test]
fn help_lists_the_external_interface_flags() {
    let output = deploykit(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--verify-result", "--prune", "--selector", "--template-paths", "--max-watch-seconds"] {
        assert!(stdout.contains(flag), "missing {flag} in --help output");
    }
}
