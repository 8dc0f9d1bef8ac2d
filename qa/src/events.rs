//! Event stream for run observation
//!
//! The executor emits one event per state transition onto a bounded mpsc
//! channel. The presenter drains the receiver until the channel closes;
//! closure is the stream's completion signal, there is no separate done
//! flag.

use tokio::sync::mpsc;

use crate::domain::{Command, CommandResult, Phase};

/// Channel capacity: enough headroom to decouple producer bursts from the
/// presenter without unbounded growth.
pub const CHANNEL_CAPACITY: usize = 100;

/// Everything observable during a run
#[derive(Debug, Clone)]
pub enum Event {
    /// A command has started executing
    CommandStarted { command: Command },
    /// A command has finished, successfully or not
    CommandFinished { result: CommandResult },
    /// A check was skipped because its cache entry is still valid.
    /// Emitted instead of Started/Finished.
    CommandCached { command: Command },
    /// A phase has run all of its work. Emitted exactly once per phase,
    /// strictly after that phase's command events.
    PhaseCompleted { phase: Phase, success: bool },
}

impl Event {
    /// Event type name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::CommandStarted { .. } => "CommandStarted",
            Event::CommandFinished { .. } => "CommandFinished",
            Event::CommandCached { .. } => "CommandCached",
            Event::PhaseCompleted { .. } => "PhaseCompleted",
        }
    }
}

/// Create the event channel for one run
pub fn channel() -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
    mpsc::channel(CHANNEL_CAPACITY)
}
