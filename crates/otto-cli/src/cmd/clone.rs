//! `otto clone <project_dir> <pack> [dest_pack]`

use std::path::Path;

use otto_core::pack;
use otto_core::{Command, CommandError, Invocation, Layer};
use otto_schema::{OTTO_DIR, PackName};

/// Copy a pack out of another project into this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClonePack;

impl Command for ClonePack {
    fn name(&self) -> &str {
        "clone"
    }

    fn docs(&self) -> Option<&str> {
        Some(
            "Copy a pack from another project into this project, optionally under
            a new name.

              $ otto clone ../webapp local webapp",
        )
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let (project, pack, dest) = match args {
            [project, pack] => (project, pack, None),
            [project, pack, dest] => (project, pack, Some(dest)),
            _ => return Err(invocation.usage("<project_dir> <pack> [dest_pack]")),
        };

        let pack = PackName::new(pack)?;
        let dest_pack = match dest {
            Some(dest) => PackName::new(dest)?,
            None => pack.clone(),
        };

        let source_root = Path::new(project).join(OTTO_DIR);
        let cloned = pack::clone_pack(
            invocation.layout(),
            &source_root,
            &pack,
            dest_pack,
            Layer::Local,
        )?;

        invocation.reporter().success(&format!(
            "Cloned {pack} into {}",
            cloned.dir().display()
        ));
        invocation.refresh();
        Ok(())
    }
}
