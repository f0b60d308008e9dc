//! otto - run your own commands from anywhere

use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use otto_cli::Cli;
use otto_core::Interrupt;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Commands block on child processes and the terminal, so they run off
    // the runtime while Ctrl-C is watched here. Children get the SIGINT
    // themselves; the command sees the latch at its next step.
    let interrupt = Interrupt::new();
    let watcher = interrupt.clone();
    let mut task = tokio::task::spawn_blocking(move || otto_cli::run(&cli, interrupt));

    let result = loop {
        tokio::select! {
            joined = &mut task => break joined?,
            signal = tokio::signal::ctrl_c(), if !watcher.is_raised() => {
                signal?;
                tracing::debug!("Interrupt received, waiting for the command to stop");
                watcher.raise();
            }
        }
    };

    let interrupted = watcher.is_raised();
    match result {
        Ok(()) if !interrupted => Ok(ExitCode::SUCCESS),
        Err(e) if !interrupted && !e.is_interrupted() => {
            tracing::debug!("{e:?}");
            eprintln!("{} {e}", "Exiting:".red().bold());
            Ok(ExitCode::FAILURE)
        }
        _ => {
            eprintln!("\n{}", "Exiting...".dark_grey());
            Ok(ExitCode::FAILURE)
        }
    }
}
