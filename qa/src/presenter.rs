//! Terminal rendering of the event stream
//!
//! Drains the executor's event receiver until the channel closes. One
//! line per finished or skipped command; output of failing commands is
//! printed in full, successful output is suppressed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use colored::Colorize;
use tokio::sync::mpsc;

use crate::domain::CommandResult;
use crate::events::Event;

/// Durations below this are noise and not displayed
const DURATION_DISPLAY_THRESHOLD: Duration = Duration::from_millis(500);

pub struct Presenter {
    started: HashMap<String, Instant>,
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            started: HashMap::new(),
        }
    }

    /// Consume events until the stream closes. Run as a spawned task and
    /// await its handle after the executor returns.
    pub async fn run(mut self, mut events: mpsc::Receiver<Event>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::CommandStarted { command } => {
                self.started.insert(command.id(), Instant::now());
            }
            Event::CommandFinished { result } => {
                let elapsed = self
                    .started
                    .remove(&result.command.id())
                    .map(|start| start.elapsed());
                self.print_finished(&result, elapsed);
            }
            Event::CommandCached { command } => {
                println!("{}", format!("○ {} (cached)", command.text).dimmed());
            }
            Event::PhaseCompleted { phase, success } => {
                if !success {
                    println!("{}", format!("{phase} phase failed").red().bold());
                }
            }
        }
    }

    fn print_finished(&self, result: &CommandResult, elapsed: Option<Duration>) {
        let suffix = match elapsed {
            Some(d) if d >= DURATION_DISPLAY_THRESHOLD => {
                format!(" {}", format_duration(d).dimmed())
            }
            _ => String::new(),
        };

        if result.succeeded() {
            println!("{} {}{suffix}", "✓".green(), result.command.text.green());
        } else {
            println!("{} {}{suffix}", "✗".red(), result.command.text.red());
            if !result.output.is_empty() {
                println!();
                println!("{}", result.output.trim_end().red());
            }
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        format!("{}ms", d.as_millis())
    } else if d < Duration::from_secs(60) {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m{}s", secs / 60, secs % 60)
    }
}
