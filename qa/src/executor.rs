//! Two-phase concurrent executor
//!
//! Runs the format phase to completion, then (only on success) the checks
//! phase, consulting the cache to skip checks whose subtree is unchanged.
//! Every state transition is emitted on the event channel; dropping the
//! executor at the end of `run` drops the last sender and closes the
//! stream, which is the consumer's completion signal.
//!
//! Scheduling is a one-shot fan-out/join per phase step: one task per
//! format group (commands inside a group run sequentially, stopping at
//! the first failure) and one task per missed check (fully parallel).
//! A failure never cancels sibling work; the join barrier always waits
//! for every worker, and the phase result is the AND over outcomes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::domain::{Cache, Command, CommandRunner, ConfigSet, Phase};
use crate::events::{self, Event};

pub struct Executor {
    runner: Arc<dyn CommandRunner>,
    cache: Arc<dyn Cache>,
    events_tx: mpsc::Sender<Event>,
}

impl Executor {
    /// Create an executor and the receiving end of its event stream. The
    /// caller hands the receiver to a presenter before calling `run`.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        cache: Arc<dyn Cache>,
    ) -> (Self, mpsc::Receiver<Event>) {
        let (events_tx, events_rx) = events::channel();
        (
            Self {
                runner,
                cache,
                events_tx,
            },
            events_rx,
        )
    }

    /// Run both phases. Returns overall success; the event stream closes
    /// when this returns.
    pub async fn run(self, config: ConfigSet) -> bool {
        let format_ok = self.run_format(config.format).await;
        self.emit(Event::PhaseCompleted {
            phase: Phase::Format,
            success: format_ok,
        })
        .await;

        if !format_ok {
            // Checks never run and the cache is never flushed.
            return false;
        }

        let checks_ok = self.run_checks(config.checks).await;

        // Flush exactly once, after the checks join barrier. A flush
        // failure costs future skips, not this run's result.
        if let Err(e) = self.cache.flush().await {
            warn!("failed to flush cache: {e:#}");
        }

        self.emit(Event::PhaseCompleted {
            phase: Phase::Checks,
            success: checks_ok,
        })
        .await;

        checks_ok
    }

    /// Format phase: groups fan out, commands within a group run in
    /// declared order and stop at the group's first failure.
    async fn run_format(&self, groups: HashMap<PathBuf, Vec<Command>>) -> bool {
        if groups.is_empty() {
            return true;
        }

        let mut workers = JoinSet::new();
        for (dir, commands) in groups {
            debug!(dir = %dir.display(), commands = commands.len(), "Executor: spawning format group");
            let runner = Arc::clone(&self.runner);
            let events_tx = self.events_tx.clone();
            workers.spawn(run_sequential(runner, events_tx, commands));
        }

        join_all(workers).await
    }

    /// Checks phase: cache hits are skipped with a `CommandCached` event;
    /// misses all run concurrently and report their outcome to the cache.
    async fn run_checks(&self, checks: Vec<Command>) -> bool {
        if checks.is_empty() {
            return true;
        }

        let mut workers = JoinSet::new();
        for command in checks {
            if self.cache.hit(&command).await {
                debug!(command = %command.id(), "Executor: cache hit, skipping check");
                self.emit(Event::CommandCached { command }).await;
                continue;
            }

            let runner = Arc::clone(&self.runner);
            let cache = Arc::clone(&self.cache);
            let events_tx = self.events_tx.clone();
            workers.spawn(async move {
                let _ = events_tx
                    .send(Event::CommandStarted {
                        command: command.clone(),
                    })
                    .await;
                let result = runner.run(&command).await;
                let success = result.succeeded();
                let _ = events_tx.send(Event::CommandFinished { result }).await;
                cache.record_result(&command, success).await;
                success
            });
        }

        join_all(workers).await
    }

    async fn emit(&self, event: Event) {
        // Send only fails when the presenter is gone; the run proceeds.
        let _ = self.events_tx.send(event).await;
    }
}

/// Run a format group's commands in order, stopping at the first failure.
async fn run_sequential(
    runner: Arc<dyn CommandRunner>,
    events_tx: mpsc::Sender<Event>,
    commands: Vec<Command>,
) -> bool {
    for command in commands {
        let _ = events_tx
            .send(Event::CommandStarted {
                command: command.clone(),
            })
            .await;
        let result = runner.run(&command).await;
        let success = result.succeeded();
        let _ = events_tx.send(Event::CommandFinished { result }).await;

        if !success {
            return false;
        }
    }
    true
}

/// Join barrier: wait for every worker, AND their outcomes. A panicked
/// worker counts as a failure.
async fn join_all(mut workers: JoinSet<bool>) -> bool {
    let mut ok = true;
    while let Some(joined) = workers.join_next().await {
        ok &= joined.unwrap_or(false);
    }
    ok
}
