// CLI surface tests: help output and failures that happen before any network call

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary pointed at an empty config file so the user's own settings never leak in.
fn jira_cli(dir: &TempDir) -> Command {
    let config = dir.path().join("jira.toml");
    std::fs::write(&config, "").unwrap();

    let mut cmd = Command::cargo_bin("jira-cli").unwrap();
    cmd.current_dir(dir.path())
        .arg("--config")
        .arg(config)
        .env_remove("JIRA_WORKFLOW_CONTENT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_command_groups() {
    let dir = TempDir::new().unwrap();
    jira_cli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("issue"))
        .stdout(predicate::str::contains("project"))
        .stdout(predicate::str::contains("version"))
        .stdout(predicate::str::contains("workflow"));
}

#[test]
fn test_transition_help_documents_workflow_flag() {
    let dir = TempDir::new().unwrap();
    jira_cli(&dir)
        .args(["issue", "transition", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--workflow"))
        .stdout(predicate::str::contains("--exclude"))
        .stdout(predicate::str::contains("workflow.yaml"));
}

#[test]
fn test_issue_version_help_documents_creation_opt_out() {
    let dir = TempDir::new().unwrap();
    jira_cli(&dir)
        .args(["issue", "version", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("will be created"))
        .stdout(predicate::str::contains("--no-create"))
        .stdout(predicate::str::contains("--no-deployment-issue"));
}

#[test]
fn test_transition_requires_issue_keys() {
    let dir = TempDir::new().unwrap();
    jira_cli(&dir)
        .args(["issue", "transition", "Done"])
        .assert()
        .failure();
}

#[test]
fn test_missing_workflow_file_fails_before_connecting() {
    let dir = TempDir::new().unwrap();
    jira_cli(&dir)
        .args(["issue", "transition", "Done", "TEST-1", "-w", "missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("workflow file not found"));
}

#[test]
fn test_worklog_rejects_malformed_date() {
    let dir = TempDir::new().unwrap();
    jira_cli(&dir)
        .args(["issue", "worklog", "add", "15", "TEST-1", "--date", "02-04-2019"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[YYYY-MM-DD]"));
}

#[test]
fn test_workflow_path_from_layout_file() {
    let dir = TempDir::new().unwrap();
    let layout = dir.path().join("layout.json");
    std::fs::write(
        &layout,
        r#"{"layout": {
            "statuses": [
                {"id": "1", "name": "Open"},
                {"id": "2", "name": "In Progress"},
                {"id": "3", "name": "Closed"}
            ],
            "transitions": [
                {"id": "11", "name": "Start", "sourceId": "1", "targetId": "2"},
                {"id": "21", "name": "Close", "sourceId": "2", "targetId": "3"}
            ]
        }}"#,
    )
    .unwrap();

    jira_cli(&dir)
        .args(["workflow", "path", "open", "CLOSED", "--layout"])
        .arg(&layout)
        .assert()
        .success()
        .stdout(predicate::str::contains("Open --[Start]-->"))
        .stdout(predicate::str::contains("In Progress --[Close]-->"))
        .stdout(predicate::str::contains("2 transition(s)"));
}
