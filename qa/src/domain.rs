//! Core domain types
//!
//! Value objects shared by the loader, cache, executor, and presenter,
//! plus the capability traits that let the executor stay ignorant of
//! how commands run and how results are cached.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

/// A single shell command bound to the directory it runs in.
///
/// Commands are created by the config loader and never mutated. Identity
/// for display and cache keying is the `(working_dir, text)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    /// Shell command text, run via `sh -c`
    pub text: String,

    /// Directory the command runs in (the declaring config file's directory)
    pub working_dir: PathBuf,
}

impl Command {
    pub fn new(text: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Stable identity key: `<working_dir>:<text>`
    pub fn id(&self) -> String {
        format!("{}:{}", self.working_dir.display(), self.text)
    }
}

/// Terminal state of an executed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Completed,
    Failed,
}

/// The two ordered phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Format,
    Checks,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Format => write!(f, "format"),
            Phase::Checks => write!(f, "checks"),
        }
    }
}

/// Outcome of one command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub command: Command,
    pub state: CommandState,

    /// Combined stdout and stderr text
    pub output: String,

    pub exit_code: i32,
}

impl CommandResult {
    pub fn succeeded(&self) -> bool {
        self.state == CommandState::Completed
    }
}

/// The merged configuration for a run.
///
/// `format` groups commands by declaring directory, preserving declaration
/// order within each group. `checks` preserves the depth-first traversal
/// order of the config files (a file's own checks before its includes').
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSet {
    pub format: HashMap<PathBuf, Vec<Command>>,
    pub checks: Vec<Command>,
}

impl ConfigSet {
    pub fn is_empty(&self) -> bool {
        self.format.is_empty() && self.checks.is_empty()
    }
}

/// Skip-decision service consulted by the executor.
///
/// Implemented by [`crate::cache::GitCache`] and, when caching is disabled
/// or unavailable, by [`crate::cache::NoopCache`].
#[async_trait]
pub trait Cache: Send + Sync {
    /// True only when the command's subtree is clean and its committed
    /// tree hash matches the one recorded at the last pass.
    async fn hit(&self, cmd: &Command) -> bool;

    /// Buffer the outcome of an executed command. No durable I/O.
    async fn record_result(&self, cmd: &Command, success: bool);

    /// Persist buffered passes. Called exactly once, after the checks phase.
    async fn flush(&self) -> eyre::Result<()>;
}

/// Executes a single command to completion.
///
/// Failures are data, not errors: a command that cannot be spawned or is
/// cancelled surfaces as a [`CommandResult`] with [`CommandState::Failed`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &Command) -> CommandResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_id() {
        let cmd = Command::new("cargo fmt", "crates/core");
        assert_eq!(cmd.id(), "crates/core:cargo fmt");
    }

    #[test]
    fn test_same_path_and_text_are_equal() {
        let a = Command::new("make lint", "services/api");
        let b = Command::new("make lint", "services/api");
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Format.to_string(), "format");
        assert_eq!(Phase::Checks.to_string(), "checks");
    }

    #[test]
    fn test_result_succeeded() {
        let cmd = Command::new("true", ".");
        let ok = CommandResult {
            command: cmd.clone(),
            state: CommandState::Completed,
            output: String::new(),
            exit_code: 0,
        };
        let bad = CommandResult {
            command: cmd,
            state: CommandState::Failed,
            output: String::new(),
            exit_code: 2,
        };
        assert!(ok.succeeded());
        assert!(!bad.succeeded());
    }
}
