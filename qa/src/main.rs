//! qa - CLI entry point
//!
//! Wires the loader, cache, runner, executor, and presenter together,
//! installs the ctrl-c shutdown signal, and maps the run outcome to a
//! process exit code.

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, warn};

use qa::cache::{GitCache, NoopCache};
use qa::cli::{default_cache_dir, Cli, Command, InitCommand};
use qa::config::Loader;
use qa::domain::Cache;
use qa::executor::Executor;
use qa::init;
use qa::presenter::Presenter;
use qa::runner::{self, ShellRunner};

fn setup_logging(cli_level: Option<&str>) {
    // Logs go to stderr; stdout belongs to the presenter.
    let level = cli_level.unwrap_or("warn").to_lowercase();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref());

    let code = match run(cli).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<bool> {
    if let Some(Command::Init { command }) = cli.command {
        return match command {
            InitCommand::Hook => {
                init::install_hook(Path::new("."))?;
                println!("installed .git/hooks/pre-commit");
                Ok(true)
            }
            InitCommand::Expectations { dest } => {
                let dest = dest.unwrap_or_else(|| init::DEFAULT_EXPECTATIONS_DEST.into());
                init::copy_expectations(&dest)?;
                println!("wrote {}", dest.display());
                Ok(true)
            }
        };
    }

    let cwd = std::env::current_dir().wrap_err("resolving current directory")?;
    let config = Loader::load(&cwd)?;

    let (shutdown_tx, shutdown_rx) = runner::shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, terminating in-flight commands");
            let _ = shutdown_tx.send(true);
        }
    });

    let cache: Arc<dyn Cache> = if cli.no_cache {
        Arc::new(NoopCache)
    } else {
        let cache_dir = cli.cache_dir.unwrap_or_else(default_cache_dir);
        match GitCache::new(cache_dir, &cwd).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                // Degrade to running everything rather than failing.
                info!("caching disabled: {e:#}");
                Arc::new(NoopCache)
            }
        }
    };

    let shell = Arc::new(ShellRunner::new(shutdown_rx));
    let (executor, events) = Executor::new(shell, cache);
    let presenter = tokio::spawn(Presenter::new().run(events));

    let success = executor.run(config).await;
    let _ = presenter.await;

    Ok(success)
}
