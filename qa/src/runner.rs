//! Shell command execution
//!
//! Runs each command through `sh -c` in its working directory, capturing
//! stdout and stderr into a single text blob. Failures are never errors:
//! a spawn failure, non-zero exit, signal death, or cancellation all
//! surface as a [`CommandResult`] in the Failed state.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::{Command, CommandResult, CommandRunner, CommandState};

/// Receiver side of the run-wide shutdown signal
pub type ShutdownRx = watch::Receiver<bool>;

/// Create the shutdown signal threaded through a run. Send `true` to
/// terminate in-flight commands; they report as failed.
pub fn shutdown_channel() -> (watch::Sender<bool>, ShutdownRx) {
    watch::channel(false)
}

/// Exit code reported when no real one exists (spawn failure, signal)
const GENERIC_FAILURE_CODE: i32 = 1;

// NOTE: hardcoded to sh. Will break on Windows.
pub struct ShellRunner {
    shutdown: ShutdownRx,
}

impl ShellRunner {
    pub fn new(shutdown: ShutdownRx) -> Self {
        Self { shutdown }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, cmd: &Command) -> CommandResult {
        debug!(command = %cmd.text, dir = %cmd.working_dir.display(), "ShellRunner::run: starting");

        let child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&cmd.text)
            .current_dir(&cmd.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                return CommandResult {
                    command: cmd.clone(),
                    state: CommandState::Failed,
                    output: format!("failed to start command: {e}"),
                    exit_code: GENERIC_FAILURE_CODE,
                }
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_task = tokio::spawn(read_all(stdout));
        let err_task = tokio::spawn(read_all(stderr));

        let mut shutdown = self.shutdown.clone();
        let status = tokio::select! {
            status = child.wait() => status,
            _ = cancelled(&mut shutdown) => {
                debug!(command = %cmd.text, "ShellRunner::run: cancelled, killing child");
                let _ = child.start_kill();
                child.wait().await
            }
        };

        let mut output = out_task.await.unwrap_or_default();
        output.push_str(&err_task.await.unwrap_or_default());

        let (state, exit_code) = match status {
            Ok(status) if status.success() => (CommandState::Completed, 0),
            Ok(status) => (
                CommandState::Failed,
                status.code().unwrap_or(GENERIC_FAILURE_CODE),
            ),
            Err(_) => (CommandState::Failed, GENERIC_FAILURE_CODE),
        };

        debug!(command = %cmd.text, ?state, exit_code, "ShellRunner::run: finished");
        CommandResult {
            command: cmd.clone(),
            state,
            output,
            exit_code,
        }
    }
}

/// Resolves only on an actual cancellation signal. A dropped sender means
/// no one can cancel anymore, so this pends forever rather than firing.
async fn cancelled(shutdown: &mut ShutdownRx) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn read_all<R: tokio::io::AsyncRead + Unpin>(reader: Option<R>) -> String {
    let Some(mut reader) = reader else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}
