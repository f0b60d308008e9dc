//! `otto help [name]`

use otto_core::{Command, CommandError, Invocation};

use crate::ui::list::print_listing;

const USAGE: &str = "Usage:
  $ otto                      list every command
  $ otto <[pack:]name> [args]  run a command
  $ otto help <name>          show a command's documentation
";

/// Show general usage, or the documentation of one command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Help;

impl Command for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn docs(&self) -> Option<&str> {
        Some(
            "Show general usage and every available command, or the documentation
            of a single command.

              $ otto help
              $ otto help deploy",
        )
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        match args {
            [] => {
                println!("{USAGE}");
                print_listing(&invocation.registry.list(None));
            }
            [name] => println!("{}", invocation.registry.docs(name)?),
            _ => return Err(invocation.usage("[name]")),
        }
        Ok(())
    }
}
