//! `otto mv <src> <dest>`

use otto_core::pack::{self, PackDirectory, PackError};
use otto_core::{Command, CommandError, Invocation};

use super::parse_target;

/// Rename a command, or move it to another pack.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mv;

impl Command for Mv {
    fn name(&self) -> &str {
        "mv"
    }

    fn docs(&self) -> Option<&str> {
        Some(
            "Rename a command or move it into another pack. The destination pack
            defaults to the source's pack and is created if needed. A pack left
            without commands is deleted.

              $ otto mv deploy ship
              $ otto mv deploy tools:deploy",
        )
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let [src, dest] = args else {
            return Err(invocation.usage("<src> <dest>"));
        };

        let (src_pack, src_command) = invocation.registry.resolve(src)?;
        let (dest_pack, dest_command) = parse_target(dest, || src_pack.clone())?;
        if src_pack.is_base() || dest_pack.is_base() {
            return Err(PackError::BaseReadOnly.into());
        }

        let layout = invocation.layout();
        let src_dir = PackDirectory::registered(layout, &src_pack)?;
        let dest_dir = PackDirectory::find_or_new(layout, dest_pack)?;
        pack::move_command(&src_dir, &src_command, &dest_dir, &dest_command)?;

        invocation.reporter().success(&format!(
            "Moved {src_pack}:{src_command} to {}:{dest_command}",
            dest_dir.pack()
        ));
        invocation.refresh();
        Ok(())
    }
}
