//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// qa - run quality checks from .qa.yml
#[derive(Parser)]
#[command(
    name = "qa",
    about = "Run formatters and checks from composable .qa.yml files",
    version
)]
pub struct Cli {
    /// Skip the cache, run all checks
    #[arg(long)]
    pub no_cache: bool,

    /// Cache directory (default: ~/.cache/qa)
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Subcommand to execute; bare `qa` runs the checks
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize project tooling
    Init {
        #[command(subcommand)]
        command: InitCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum InitCommand {
    /// Install a pre-commit hook that runs qa
    Hook,

    /// Create a code quality expectations document
    Expectations {
        /// Destination file
        #[arg(value_name = "DEST")]
        dest: Option<PathBuf>,
    },
}

/// Default cache location: `~/.cache/qa`
pub fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".cache").join("qa"))
        .unwrap_or_else(|| PathBuf::from(".cache/qa"))
}
