//! End-to-end tests for the qa binary
//!
//! These drive the real binary against throwaway git repositories and
//! assert on exit codes, presenter output, and cache behavior.

use std::fs;
use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// Repo with a committed `.qa.yml`
fn repo_with_config(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    git(temp.path(), &["init", "-q", "-b", "main"]);
    git(temp.path(), &["config", "user.email", "qa@test"]);
    git(temp.path(), &["config", "user.name", "qa"]);
    fs::write(temp.path().join(".qa.yml"), config).unwrap();
    git(temp.path(), &["add", "."]);
    git(temp.path(), &["commit", "-q", "-m", "add qa config"]);
    temp
}

fn qa(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("qa").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn first_run_executes_then_second_run_is_cached() {
    let repo = repo_with_config("checks:\n  - \"true\"\n");
    let cache_dir = TempDir::new().unwrap();

    qa(repo.path())
        .args(["--cache-dir"])
        .arg(cache_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cached").not());

    // One cache file exists now.
    let files: Vec<_> = fs::read_dir(cache_dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);

    // No source changes: the check is skipped.
    qa(repo.path())
        .args(["--cache-dir"])
        .arg(cache_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(cached)"));
}

#[test]
fn format_failure_short_circuits_the_run() {
    let repo = repo_with_config("format:\n  - \"exit 1\"\nchecks:\n  - \"echo checked\"\n");
    let cache_dir = TempDir::new().unwrap();

    qa(repo.path())
        .args(["--cache-dir"])
        .arg(cache_dir.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("format phase failed"))
        .stdout(predicate::str::contains("checked").not());

    // Cache was never flushed.
    assert!(fs::read_dir(cache_dir.path()).is_err() || fs::read_dir(cache_dir.path()).unwrap().count() == 0);
}

#[test]
fn failing_check_fails_the_run_and_is_not_cached() {
    let repo = repo_with_config("checks:\n  - \"true\"\n  - \"exit 7\"\n");
    let cache_dir = TempDir::new().unwrap();

    qa(repo.path())
        .args(["--cache-dir"])
        .arg(cache_dir.path())
        .assert()
        .failure()
        .code(1);

    // The passing check was recorded, so only the failing one reruns.
    qa(repo.path())
        .args(["--cache-dir"])
        .arg(cache_dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("(cached)"));
}

#[test]
fn no_cache_flag_disables_skipping() {
    let repo = repo_with_config("checks:\n  - \"true\"\n");
    let cache_dir = TempDir::new().unwrap();

    qa(repo.path())
        .args(["--cache-dir"])
        .arg(cache_dir.path())
        .assert()
        .success();

    qa(repo.path())
        .arg("--no-cache")
        .assert()
        .success()
        .stdout(predicate::str::contains("cached").not());
}

#[test]
fn missing_config_is_a_fatal_error() {
    let temp = TempDir::new().unwrap();

    qa(temp.path())
        .arg("--no-cache")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(".qa.yml"));
}

#[test]
fn malformed_config_names_the_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".qa.yml"), "checks: {broken: [\n").unwrap();

    qa(temp.path())
        .arg("--no-cache")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing"));
}

#[test]
fn runs_outside_a_git_repo_degrade_to_uncached() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".qa.yml"), "checks:\n  - \"true\"\n").unwrap();
    let cache_dir = TempDir::new().unwrap();

    // Not a repo: caching silently disabled, run still succeeds twice.
    for _ in 0..2 {
        qa(temp.path())
            .args(["--cache-dir"])
            .arg(cache_dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("cached").not());
    }
}

#[test]
fn includes_compose_checks_across_directories() {
    let repo = repo_with_config("checks:\n  - \"echo root-check\"\nincludes:\n  - sub/.qa.yml\n");
    fs::create_dir(repo.path().join("sub")).unwrap();
    fs::write(
        repo.path().join("sub/.qa.yml"),
        "checks:\n  - \"echo sub-check\"\n",
    )
    .unwrap();

    qa(repo.path())
        .arg("--no-cache")
        .assert()
        .success()
        .stdout(predicate::str::contains("echo root-check"))
        .stdout(predicate::str::contains("echo sub-check"));
}

#[test]
fn failing_command_output_is_surfaced() {
    let repo = repo_with_config("checks:\n  - \"echo broken details; exit 1\"\n");

    qa(repo.path())
        .arg("--no-cache")
        .assert()
        .failure()
        .stdout(predicate::str::contains("broken details"));
}

#[test]
fn init_hook_installs_once() {
    let repo = repo_with_config("checks: []\n");

    qa(repo.path()).args(["init", "hook"]).assert().success();
    assert!(repo.path().join(".git/hooks/pre-commit").exists());

    qa(repo.path())
        .args(["init", "hook"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_expectations_writes_document() {
    let temp = TempDir::new().unwrap();

    qa(temp.path())
        .args(["init", "expectations", "QUALITY.md"])
        .assert()
        .success();
    assert!(temp.path().join("QUALITY.md").exists());

    qa(temp.path())
        .args(["init", "expectations", "QUALITY.md"])
        .assert()
        .failure();
}
