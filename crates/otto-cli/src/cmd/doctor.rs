//! `otto dr [global]`

use otto_core::repair::repair;
use otto_core::{Command, CommandError, Invocation, Layer};

/// Rebuild a scope's documents from the scripts on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct Doctor;

impl Command for Doctor {
    fn name(&self) -> &str {
        "dr"
    }

    fn docs(&self) -> Option<&str> {
        Some(
            "Rebuild the pack registrations and command indexes of this project
            (or of ~/.otto with `global`) from the scripts on disk. Scripts are
            renamed to match the command they declare and packs without any
            commands are deleted.

              $ otto dr
              $ otto dr global",
        )
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let layer = match args {
            [] => Layer::Local,
            [scope] if scope == "global" => Layer::Global,
            _ => return Err(invocation.usage("[global]")),
        };

        let root = invocation.layout().root(layer).to_path_buf();
        let reporter = invocation.reporter();
        if !root.is_dir() {
            reporter.info(&format!("Nothing to repair in {}", root.display()));
            return Ok(());
        }

        reporter.section(&format!("Repairing {}", root.display()));
        let report = repair(&root)?;
        for (from, to) in &report.renamed {
            reporter.info(&format!("Renamed {} to {}", from.display(), to.display()));
        }
        for (path, reason) in &report.skipped {
            reporter.warning(&format!("Skipped {}: {reason}", path.display()));
        }
        for pack in &report.deleted {
            reporter.info(&format!("Deleted empty pack {pack}"));
        }
        let commands: usize = report.packs.values().sum();
        reporter.success(&format!(
            "{} packs, {commands} commands",
            report.packs.len()
        ));

        invocation.refresh();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cmd::testing::Fixture;
    use otto_core::CommandError;
    use otto_core::pack::PackError;
    use otto_schema::{ConfigDocument, IndexDocument};
    use std::fs;

    #[test]
    fn test_dr_recovers_deleted_index() {
        let mut fx = Fixture::new();
        fx.run(&["new", "deploy"]).unwrap();
        let dir = fx.layout().local_pack_dir();
        fs::remove_file(dir.join("cmds.json")).unwrap();
        fs::write(dir.join("cmds.json"), "{ not json").unwrap();

        fx.run(&["dr"]).unwrap();
        let index: IndexDocument = ConfigDocument::read(&dir.join("cmds.json")).unwrap();
        assert_eq!(index.get("deploy"), Some(dir.join("deploy.sh").as_path()));
        assert!(fx.registry.is_used("local", "deploy"));
    }

    #[test]
    fn test_dr_keeps_every_command_new_can_create() {
        let mut fx = Fixture::new();
        fx.run(&["new", "do_it"]).unwrap();
        fx.run(&["new", "tools:ping-2"]).unwrap();

        // Names that `dr` could not recover are refused up front.
        assert!(fx.run(&["new", "DoIt"]).is_err());
        assert!(matches!(
            fx.run(&["new", "res:chime"]),
            Err(CommandError::Pack(PackError::Reserved(_)))
        ));
        assert!(!fx.layout().root(otto_core::Layer::Local).join("res").exists());

        fx.run(&["dr"]).unwrap();
        assert!(fx.registry.is_used("local", "do_it"));
        assert!(fx.registry.is_used("tools", "ping-2"));
    }

    #[test]
    fn test_dr_without_local_root() {
        let mut fx = Fixture::new();
        fx.run(&["dr"]).unwrap();
        assert!(!fx.layout().root(otto_core::Layer::Local).exists());
        assert!(fx.run(&["dr", "everything"]).is_err());
    }
}
