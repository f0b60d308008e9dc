//! `otto install <archive>`

use std::path::Path;

use otto_core::archive;
use otto_core::{Command, CommandError, Invocation};

/// Install the packs of an `.opack` archive globally.
#[derive(Debug, Clone, Copy, Default)]
pub struct Install;

impl Command for Install {
    fn name(&self) -> &str {
        "install"
    }

    fn docs(&self) -> Option<&str> {
        Some(
            "Install every pack in an .opack archive into ~/.otto so its commands
            work from any directory.

              $ otto install mytools.opack",
        )
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let [path] = args else {
            return Err(invocation.usage("<archive>"));
        };

        let installed = archive::install(invocation.layout(), Path::new(path))?;
        for pack in &installed {
            invocation.reporter().success(&format!("Installed {pack}"));
        }
        invocation.refresh();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cmd::testing::Fixture;

    #[test]
    fn test_pack_install_uninstall() {
        let mut fx = Fixture::new();
        fx.run(&["new", "deploy"]).unwrap();
        fx.run(&["pack", "shipit"]).unwrap();

        let archive = fx.layout().project_dir().join("shipit.opack");
        assert!(archive.is_file());

        fx.run(&["install", archive.to_str().unwrap()]).unwrap();
        assert!(fx.registry.is_used("shipit", "deploy"));
        assert!(fx.run(&["install", archive.to_str().unwrap()]).is_err());

        fx.run(&["uninstall", "shipit"]).unwrap();
        assert!(!fx.registry.pack_keys().contains("shipit"));
        assert!(fx.run(&["uninstall", "shipit"]).is_err());
    }

    #[test]
    fn test_install_missing_archive() {
        let mut fx = Fixture::new();
        let missing = fx.tmp.path().join("nope.opack");
        assert!(fx.run(&["install", missing.to_str().unwrap()]).is_err());
    }
}
