use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;

mod context;
mod controller;
mod logging;
mod pipeline;
mod profile;
mod scheduler;
mod server;
mod state;

#[cfg(test)]
mod tests;

use crate::controller::AppController;
use crate::pipeline::RunOutcome;
use crate::state::AppState;

/// Periodically capture the screen, OCR it and keep a daily activity report
#[derive(Parser, Debug)]
#[command(name = "recap", version)]
struct Args {
    /// JSON config file; `./config.json` is used when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single capture cycle and exit
    #[arg(long)]
    once: bool,

    /// Override the report server bind address
    #[arg(long)]
    bind: Option<String>,

    /// Write the default config to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _ = dotenvy::dotenv();

    if let Some(path) = &args.write_config {
        logging::init(recap_config::LogFormat::Pretty);
        return profile::write_default_config(path);
    }

    let mut config = profile::load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    logging::init(config.log_format);

    let state = Arc::new(AppState::new(config)?);

    if args.once {
        match state.orchestrator.run_cycle().await? {
            RunOutcome::Appended { date, records } => {
                tracing::info!(%date, records, "Capture recorded");
            }
            RunOutcome::EmptySkipped => tracing::info!("No text recognized, nothing recorded"),
            RunOutcome::Skipped => {}
        }
        return Ok(());
    }

    let addr: SocketAddr = state
        .config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", state.config.server.bind))?;

    let controller = AppController::new(state.clone());
    let mut tasks = controller.spawn_tasks(addr);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::warn!("A background task exited early"),
                Ok(Err(e)) => tracing::error!("A background task failed: {:#}", e),
                Err(e) => tracing::error!("A background task panicked: {}", e),
            }
        }
    }

    controller.shutdown();

    let drain = async {
        while let Some(result) = tasks.join_next().await {
            if let Ok(Err(e)) = result {
                tracing::error!("Task failed during shutdown: {:#}", e);
            }
        }
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        tracing::warn!("Tasks did not stop within {:?}, aborting", SHUTDOWN_GRACE);
        tasks.abort_all();
    }

    // Let an in-flight cycle finish its append and readable rebuild.
    let settle = async {
        while state.orchestrator.is_running() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, settle).await.is_err() {
        tracing::warn!("Pipeline cycle still running at exit");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
