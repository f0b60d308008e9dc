//! `otto rm <name>`

use otto_core::pack::{PackDirectory, PackError};
use otto_core::{Command, CommandError, Invocation};

/// Delete a command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rm;

impl Command for Rm {
    fn name(&self) -> &str {
        "rm"
    }

    fn docs(&self) -> Option<&str> {
        Some("Delete a command and its script. A pack left without commands is deleted.")
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let [name] = args else {
            return Err(invocation.usage("<name>"));
        };

        let (pack, command) = invocation.registry.resolve(name)?;
        if pack.is_base() {
            return Err(PackError::BaseReadOnly.into());
        }

        let dir = PackDirectory::registered(invocation.layout(), &pack)?;
        let deleted = dir.remove_command(&command)?;

        let reporter = invocation.reporter();
        reporter.success(&format!("Removed {pack}:{command}"));
        if deleted {
            reporter.info(&format!("{pack} has no commands left and was deleted"));
        }
        invocation.refresh();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cmd::testing::Fixture;

    #[test]
    fn test_rm_removes_script_and_pack() {
        let mut fx = Fixture::new();
        fx.run(&["new", "deploy"]).unwrap();
        let script = fx.layout().local_pack_dir().join("deploy.sh");
        assert!(script.is_file());

        fx.run(&["rm", "deploy"]).unwrap();
        assert!(!script.exists());
        assert!(!fx.registry.is_used("local", "deploy"));
        assert!(fx.run(&["rm", "deploy"]).is_err());
    }
}
