//! `otto new <[pack:]name> [args ...]`

use otto_core::pack::{PackDirectory, PackError};
use otto_core::{Command, CommandError, Invocation, script};
use otto_schema::PackName;

use super::{edit_file, parse_target};

/// Create a command script from a template and open it in `$EDITOR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct New;

impl Command for New {
    fn name(&self) -> &str {
        "new"
    }

    fn docs(&self) -> Option<&str> {
        Some(
            "Create a new command and open it in $EDITOR. Without a pack the command
            goes into this project's local pack. Any further words become the
            command's argument signature.

              $ otto new deploy env [tag]
              $ otto new tools:ping host",
        )
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let Some((name, signature)) = args.split_first() else {
            return Err(invocation.usage("<[pack:]name> [args ...]"));
        };

        let (pack, command) = parse_target(name, PackName::local)?;
        if pack.is_base() {
            return Err(PackError::BaseReadOnly.into());
        }
        if !invocation.registry.is_available(&pack, &command) {
            return Err(PackError::CommandExists { pack, command }.into());
        }

        let dir = PackDirectory::find_or_new(invocation.layout(), pack)?;
        let path = dir.add_command(&command, &script::template(&command.symbol(), signature))?;
        invocation
            .reporter()
            .success(&format!("Created {}:{command}", dir.pack()));
        invocation.refresh();

        edit_file(invocation, &path)
    }
}
