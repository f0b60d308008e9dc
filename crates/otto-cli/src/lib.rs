//! otto - run your own commands from anywhere
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Commands are small scripts grouped into packs. The `base` pack is compiled
//! into this binary, installed packs live under `~/.otto`, and each project
//! can carry its own `local` pack in `./.otto`.
//!
//! ```text
//! $ otto new deploy env       # create .otto/local/deploy.sh and open it
//! $ otto deploy staging       # run it
//! $ otto pack mytools         # share the project's packs as mytools.opack
//! $ otto install mytools.opack
//! ```

pub mod cmd;
pub mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use otto_core::{
    CommandError, Dispatcher, DryRunner, Interrupt, Layout, ProcessRunner, Session, SystemRunner,
};

use crate::ui::Output;

#[derive(Debug, Parser)]
#[command(name = "otto")]
#[command(author, version, about = "otto - run your own commands from anywhere")]
pub struct Cli {
    /// Global otto directory (defaults to ~/.otto)
    #[arg(long, env = "OTTO_HOME", value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print external programs instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Command to run, as `name` or `pack:name`, followed by its arguments
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl Cli {
    /// The command name and its arguments, if a command was given.
    pub fn invocation(&self) -> Option<(&str, &[String])> {
        self.command
            .split_first()
            .map(|(name, args)| (name.as_str(), args))
    }
}

/// Build the session and dispatcher for `cli` and run the requested command.
/// Without a command, every available command is listed. `interrupt` is
/// raised by the caller when the user presses Ctrl-C.
pub fn run(cli: &Cli, interrupt: Interrupt) -> Result<(), CommandError> {
    let layout = Layout::discover(cli.home.clone())?;
    tracing::debug!(
        "Global root {}, local root {}",
        layout.root(otto_core::Layer::Global).display(),
        layout.root(otto_core::Layer::Local).display()
    );

    let runner: Arc<dyn ProcessRunner> = if cli.dry_run {
        Arc::new(DryRunner::new())
    } else {
        Arc::new(SystemRunner)
    };
    let session = Session::new(layout, runner, Arc::new(Output::new(cli.quiet)))
        .with_interrupt(interrupt);
    let mut dispatcher = Dispatcher::new(session, cmd::builtins())?;

    match cli.invocation() {
        Some((name, args)) => dispatcher.handle(name, args),
        None => {
            ui::list::print_listing(&dispatcher.list(None));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_and_args() {
        let cli = Cli::parse_from(["otto", "-q", "deploy", "staging", "--force", "-v"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);

        let (name, args) = cli.invocation().unwrap();
        assert_eq!(name, "deploy");
        assert_eq!(args, ["staging", "--force", "-v"]);
    }

    #[test]
    fn test_parse_qualified_name() {
        let cli = Cli::parse_from(["otto", "tools:ping", "localhost"]);
        assert_eq!(cli.invocation().unwrap().0, "tools:ping");
    }

    #[test]
    fn test_parse_no_command() {
        let cli = Cli::parse_from(["otto", "--dry-run"]);
        assert!(cli.dry_run);
        assert!(cli.invocation().is_none());
    }
}
