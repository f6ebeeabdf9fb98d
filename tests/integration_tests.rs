//! Integration tests for Foreman
//!
//! These tests drive the `foreman` binary through whole project lifecycles.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a foreman Command isolated from the caller's environment
fn foreman(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("foreman");
    cmd.current_dir(dir.path())
        .env_remove("FOREMAN_REVIEWER")
        .env_remove("FOREMAN_AUTO_ADVANCE")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn write(dir: &TempDir, rel: &str, content: &str) {
    let path = dir.path().join(".foreman").join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn read_state(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join(".foreman/state.yaml")).unwrap()
}

fn status_json(dir: &TempDir) -> serde_json::Value {
    let output = foreman(dir).args(["status", "--json"]).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_foreman_help() {
        cargo_bin_cmd!("foreman").arg("--help").assert().success();
    }

    #[test]
    fn test_foreman_version() {
        cargo_bin_cmd!("foreman").arg("--version").assert().success();
    }

    #[test]
    fn test_init_creates_structure() {
        let dir = create_temp_project();

        foreman(&dir)
            .args(["init", "--name", "weather"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized foreman project 'weather'"));

        assert!(dir.path().join(".foreman/foreman.toml").exists());
        assert!(dir.path().join(".foreman/state.yaml").exists());
        assert!(dir.path().join(".foreman/designs").is_dir());
        assert!(dir.path().join(".foreman/phases").is_dir());
        assert!(dir.path().join(".foreman/briefs").is_dir());
        assert!(read_state(&dir).contains("current_stage: requirements"));
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();

        foreman(&dir)
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_init_rejects_unknown_preset() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--preset", "enterprise"])
            .assert()
            .failure();
        assert!(!dir.path().join(".foreman").exists());
    }

    #[test]
    fn test_init_rejects_workflow_without_implementation() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--workflow", "requirements,design"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("implementation"));
    }

    #[test]
    fn test_commands_require_a_project() {
        let dir = create_temp_project();
        foreman(&dir)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("foreman init"));
    }
}

// =============================================================================
// Gate Lifecycle
// =============================================================================

mod gate_lifecycle {
    use super::*;

    #[test]
    fn test_requirements_gate_blocks_until_written() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();

        foreman(&dir)
            .arg("gate")
            .assert()
            .success()
            .stdout(predicate::str::contains("requirements.md"));
        assert!(read_state(&dir).contains("current_stage: requirements"));
    }

    #[test]
    fn test_full_workflow_completes() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();

        write(&dir, "requirements.md", "# Weather CLI\n\nFetch forecasts.\n");
        foreman(&dir)
            .arg("gate")
            .assert()
            .success()
            .stdout(predicate::str::contains("Advanced to stage"));

        write(&dir, "designs/architecture.md", "# Architecture\n\nOne binary.\n");
        foreman(&dir).args(["gate", "design"]).assert().success();

        write(&dir, "phases/overview.md", "# Phases\n");
        write(&dir, "phases/01-setup.md", "# Setup\n");
        write(&dir, "phases/02-api.md", "# API client\n");
        foreman(&dir).args(["gate", "phases"]).assert().success();
        assert!(read_state(&dir).contains("current_stage: implementation"));

        foreman(&dir)
            .arg("phases")
            .assert()
            .success()
            .stdout(predicate::str::contains("01-setup"))
            .stdout(predicate::str::contains("02-api"));

        foreman(&dir)
            .args(["gate", "implementation"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 phases not completed"));

        foreman(&dir)
            .args(["phase", "01-setup", "done"])
            .assert()
            .success();
        foreman(&dir)
            .args(["phase", "02-api", "done"])
            .assert()
            .success()
            .stdout(predicate::str::contains("All phases done"));

        foreman(&dir)
            .args(["gate", "implementation"])
            .assert()
            .success()
            .stdout(predicate::str::contains("All stages completed"));

        let status = status_json(&dir);
        assert_eq!(status["complete"], true);
        assert_eq!(status["current_stage"], "implementation");
    }

    #[test]
    fn test_human_review_reject_then_approve() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--preset", "full"])
            .assert()
            .success();
        write(&dir, "requirements.md", "# Requirements\n\nSomething.\n");

        foreman(&dir)
            .arg("gate")
            .assert()
            .success()
            .stdout(predicate::str::contains("awaiting human review"));
        assert!(read_state(&dir).contains("status: pending-review"));

        foreman(&dir)
            .args(["gate", "requirements", "--reject", "--reason", "too vague"])
            .assert()
            .success()
            .stdout(predicate::str::contains("rejected"));
        let state = read_state(&dir);
        assert!(state.contains("too vague"));
        assert!(state.contains("current_stage: requirements"));

        // Approval needs a fresh validation first
        foreman(&dir)
            .args(["gate", "requirements", "--approve"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("pending-review"));

        foreman(&dir).arg("gate").assert().success();
        foreman(&dir)
            .args(["gate", "requirements", "--approve"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Advanced to stage"));

        let status = status_json(&dir);
        assert_eq!(status["current_stage"], "design");
        assert_eq!(status["gates"][0]["approved_by"], "human");
    }

    #[test]
    fn test_review_with_yes_approves() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--preset", "full"])
            .assert()
            .success();
        write(&dir, "requirements.md", "# Requirements\n\nSomething.\n");
        foreman(&dir).arg("gate").assert().success();

        foreman(&dir)
            .args(["--yes", "gate", "--review"])
            .assert()
            .success()
            .stdout(predicate::str::contains("approved"));
        assert_eq!(status_json(&dir)["current_stage"], "design");
    }

    #[test]
    fn test_reviewer_override_routes_gate() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();

        foreman(&dir)
            .args(["gate", "requirements", "--reviewer", "human"])
            .assert()
            .success();
        let toml = fs::read_to_string(dir.path().join(".foreman/foreman.toml")).unwrap();
        assert!(toml.contains("requirements = \"human\""));

        write(&dir, "requirements.md", "# Requirements\n\nSomething.\n");
        foreman(&dir)
            .arg("gate")
            .assert()
            .success()
            .stdout(predicate::str::contains("awaiting human review"));
    }

    #[test]
    fn test_gate_for_stage_outside_workflow_fails() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--quick"])
            .assert()
            .success();

        foreman(&dir)
            .args(["gate", "design"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not part of this project's workflow"));
    }

    #[test]
    fn test_gate_unknown_stage_fails() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();

        foreman(&dir)
            .args(["gate", "deployment"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("deployment"));
    }

    #[test]
    fn test_confidence_below_threshold_does_not_approve() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["quick", "add a --json flag"])
            .assert()
            .success();

        foreman(&dir)
            .args(["gate", "--confidence", "50"])
            .assert()
            .success()
            .stdout(predicate::str::contains("below the auto-advance threshold"));
        assert_eq!(status_json(&dir)["current_stage"], "requirements");

        foreman(&dir)
            .args(["gate", "--confidence", "85"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Gate approved automatically"));
        assert_eq!(status_json(&dir)["current_stage"], "implementation");
        assert_eq!(status_json(&dir)["gates"][0]["approved_by"], "auto");
    }

    #[test]
    fn test_confidence_does_not_bypass_validation() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--preset", "light"])
            .assert()
            .success();

        foreman(&dir)
            .args(["gate", "--confidence", "90"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Requirements document missing"));

        let status = status_json(&dir);
        assert_eq!(status["current_stage"], "requirements");
        assert_eq!(status["gates"][0]["status"], "open");
    }

    #[test]
    fn test_confidence_respects_human_reviewer() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--preset", "light"])
            .assert()
            .success();
        foreman(&dir)
            .args(["gate", "requirements", "--reviewer", "human"])
            .assert()
            .success();
        write(&dir, "requirements.md", "# Requirements\n\nSomething.\n");

        foreman(&dir)
            .args(["gate", "--confidence", "90"])
            .assert()
            .success()
            .stdout(predicate::str::contains("awaiting human review"));

        let status = status_json(&dir);
        assert_eq!(status["current_stage"], "requirements");
        assert_eq!(status["gates"][0]["status"], "pending-review");
    }

    #[test]
    fn test_reviewer_override_wins_over_env_default() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();

        foreman(&dir)
            .env("FOREMAN_REVIEWER", "human")
            .args(["gate", "requirements", "--reviewer", "auto"])
            .assert()
            .success();
        let toml = fs::read_to_string(dir.path().join(".foreman/foreman.toml")).unwrap();
        assert!(toml.contains("requirements = \"auto\""));

        write(&dir, "requirements.md", "# Requirements\n\nSomething.\n");
        foreman(&dir)
            .env("FOREMAN_REVIEWER", "human")
            .arg("gate")
            .assert()
            .success()
            .stdout(predicate::str::contains("Reviewer: auto"))
            .stdout(predicate::str::contains("Gate approved automatically"));
        assert_eq!(status_json(&dir)["current_stage"], "design");
    }
}

// =============================================================================
// Quick Mode
// =============================================================================

mod quick_mode {
    use super::*;

    #[test]
    fn test_quick_project_completes() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["quick", "add a --json flag to status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Quick project initialized"));

        let requirements =
            fs::read_to_string(dir.path().join(".foreman/requirements.md")).unwrap();
        assert!(requirements.contains("add a --json flag to status"));

        foreman(&dir).arg("gate").assert().success();
        assert_eq!(status_json(&dir)["current_stage"], "implementation");

        write(&dir, "phases/01-flag.md", "# Add the flag\n");
        foreman(&dir)
            .args(["phase", "01-flag", "in-progress"])
            .assert()
            .success();
        foreman(&dir)
            .args(["phase", "01-flag", "done"])
            .assert()
            .success();

        foreman(&dir)
            .arg("gate")
            .assert()
            .success()
            .stdout(predicate::str::contains("All stages completed"));
        assert_eq!(status_json(&dir)["complete"], true);
    }

    #[test]
    fn test_quick_with_brief() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["quick", "fix the login bug", "--brief"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Generated brief"))
            .stdout(predicate::str::contains("fix the login bug"));

        assert!(dir.path().join(".foreman/briefs/impl.md").exists());
        let status = status_json(&dir);
        assert_eq!(status["current_stage"], "implementation");
        assert_eq!(status["quick_mode"], true);
        assert_eq!(status["gates"][0]["approved_by"], "auto");
    }

    #[test]
    fn test_phase_unknown_name_fails() {
        let dir = create_temp_project();
        foreman(&dir).args(["quick", "task"]).assert().success();

        foreman(&dir)
            .args(["phase", "01-missing", "done"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("01-missing"));
    }

    #[test]
    fn test_phase_invalid_status_fails() {
        let dir = create_temp_project();
        foreman(&dir).args(["quick", "task"]).assert().success();
        write(&dir, "phases/01-build.md", "# Build\n");

        foreman(&dir)
            .args(["phase", "01-build", "finished"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("finished"));
    }
}

// =============================================================================
// Status, Briefs and Config
// =============================================================================

mod reporting {
    use super::*;

    #[test]
    fn test_status_text_output() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--name", "weather"])
            .assert()
            .success();

        foreman(&dir)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Project: weather"))
            .stdout(predicate::str::contains("requirements"))
            .stdout(predicate::str::contains("Next: foreman gate requirements"));
    }

    #[test]
    fn test_status_json_lists_workflow() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--workflow", "requirements,implementation"])
            .assert()
            .success();

        let status = status_json(&dir);
        assert_eq!(
            status["workflow"],
            serde_json::json!(["requirements", "implementation"])
        );
        assert_eq!(status["gates"][0]["status"], "open");
        assert_eq!(status["gates"][1]["status"], "blocked");
        assert_eq!(status["complete"], false);
    }

    #[test]
    fn test_status_from_subdirectory() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();

        cargo_bin_cmd!("foreman")
            .current_dir(dir.path().join("src/nested"))
            .arg("status")
            .assert()
            .success();
    }

    #[test]
    fn test_phase_brief() {
        let dir = create_temp_project();
        foreman(&dir)
            .args(["init", "--tdd"])
            .assert()
            .success();
        write(&dir, "requirements.md", "# Requirements\n\nForecasts.\n");
        write(&dir, "phases/overview.md", "# Overview\n");
        write(&dir, "phases/01-setup.md", "# Setup\n\nCreate the crate.\n");

        foreman(&dir)
            .args(["brief", "01-setup"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Create the crate."))
            .stdout(predicate::str::contains("Forecasts."));

        assert!(dir.path().join(".foreman/briefs/01-setup.md").exists());
    }

    #[test]
    fn test_brief_unknown_phase_fails() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();

        foreman(&dir)
            .args(["brief", "09-nothing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("09-nothing"));
    }

    #[test]
    fn test_config_set_and_validate() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();

        foreman(&dir)
            .args(["config", "set", "reviewers.design", "human"])
            .assert()
            .success();
        foreman(&dir)
            .args(["config", "set", "workflow.auto_advance", "80"])
            .assert()
            .success();

        foreman(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("design = \"human\""))
            .stdout(predicate::str::contains("auto_advance = 80"));

        foreman(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid"));
    }

    #[test]
    fn test_config_set_rejects_bad_values() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();

        foreman(&dir)
            .args(["config", "set", "workflow.auto_advance", "150"])
            .assert()
            .failure();
        foreman(&dir)
            .args(["config", "set", "reviewers.deployment", "human"])
            .assert()
            .failure();
        foreman(&dir)
            .args(["config", "set", "nonsense", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn test_config_validate_reports_issues() {
        let dir = create_temp_project();
        foreman(&dir).arg("init").assert().success();
        write(
            &dir,
            "foreman.toml",
            "[workflow]\nstages = [\"requirements\", \"design\"]\n\n[reviewers.overrides]\nreview = \"human\"\n",
        );

        foreman(&dir)
            .args(["config", "validate"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("issue"));
    }
}
