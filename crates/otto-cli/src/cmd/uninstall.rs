//! `otto uninstall <pack>`

use otto_core::archive;
use otto_core::{Command, CommandError, Invocation};
use otto_schema::PackName;

/// Remove a globally installed pack.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uninstall;

impl Command for Uninstall {
    fn name(&self) -> &str {
        "uninstall"
    }

    fn docs(&self) -> Option<&str> {
        Some("Remove an installed pack and all of its commands from ~/.otto.")
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let [pack] = args else {
            return Err(invocation.usage("<pack>"));
        };

        let pack = PackName::new(pack)?;
        let dir = archive::uninstall(invocation.layout(), &pack)?;
        invocation
            .reporter()
            .success(&format!("Uninstalled {pack} from {}", dir.display()));
        invocation.refresh();
        Ok(())
    }
}
