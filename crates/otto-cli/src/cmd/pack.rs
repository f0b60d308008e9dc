//! `otto pack <name>`

use otto_core::archive;
use otto_core::{Command, CommandError, Invocation};
use otto_schema::PackName;

/// Package this project's packs into `<name>.opack`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pack;

impl Command for Pack {
    fn name(&self) -> &str {
        "pack"
    }

    fn docs(&self) -> Option<&str> {
        Some(
            "Turn this project's packs into <name>.opack, ready for `otto install`.
            The local pack is renamed to <name> inside the archive.",
        )
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let [name] = args else {
            return Err(invocation.usage("<name>"));
        };

        let name = PackName::new(name)?;
        let layout = invocation.layout();
        let path = archive::package(layout, &name, layout.project_dir())?;
        invocation
            .reporter()
            .success(&format!("Packed {name} into {}", path.display()));
        Ok(())
    }
}
