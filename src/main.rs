use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod cli;
mod config;
mod engine;
mod history;
mod models;
mod prober;
mod render;
mod resize;
mod runloop;
mod terminal;
mod utils;

use crate::cli::Cli;
use crate::config::MonitorConfig;
use crate::prober::HttpProber;
use crate::resize::CrosstermDimensions;
use crate::runloop::RunLoop;
use crate::terminal::TerminalSink;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::setup_console();
    let _log_guard = utils::init_logging(&cli.log_file)?;

    let config = MonitorConfig::load_or_default(&cli.config).apply(&cli.overrides());
    config.validate().context("Refusing to start")?;

    let prober = HttpProber::new()?;

    terminal::install_panic_hook();
    let sink = TerminalSink::setup()?;
    let mut run_loop = RunLoop::new(&config, prober, CrosstermDimensions, sink);

    let shutdown = CancellationToken::new();
    tokio::spawn(terminal::watch_terminal_events(shutdown.clone(), run_loop.wake_handle()));

    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            on_signal.cancel();
        }
    });

    let outcome = run_loop.run(shutdown.clone()).await;
    shutdown.cancel();
    terminal::restore_terminal()?;
    outcome
}
