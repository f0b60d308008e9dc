//! `otto cleanext <ext>`

use std::fs;

use otto_core::{Command, CommandError, Invocation};
use walkdir::WalkDir;

/// Delete every file with an extension below the current directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanExt;

impl Command for CleanExt {
    fn name(&self) -> &str {
        "cleanext"
    }

    fn docs(&self) -> Option<&str> {
        Some(
            "Erase every file with a given extension from this directory and all
            of its subdirectories. `.git` is left alone.

              $ otto cleanext pyc",
        )
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let [ext] = args else {
            return Err(invocation.usage("<ext>"));
        };
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() {
            return Err(invocation.usage("<ext>"));
        }

        let mut removed = 0;
        let walker = WalkDir::new(invocation.layout().project_dir())
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");
        for entry in walker.filter_map(Result::ok) {
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|e| e == ext) {
                tracing::debug!("Removing {}", path.display());
                fs::remove_file(path)?;
                removed += 1;
            }
        }

        invocation
            .reporter()
            .success(&format!("Removed {removed} .{ext} files"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cmd::testing::Fixture;
    use std::fs;

    #[test]
    fn test_cleanext_removes_matching_files_only() {
        let mut fx = Fixture::new();
        let project = fx.layout().project_dir().to_path_buf();
        fs::create_dir_all(project.join("src/deep")).unwrap();
        fs::create_dir_all(project.join(".git")).unwrap();
        fs::write(project.join("a.pyc"), "").unwrap();
        fs::write(project.join("src/deep/b.pyc"), "").unwrap();
        fs::write(project.join("src/keep.py"), "").unwrap();
        fs::write(project.join(".git/c.pyc"), "").unwrap();

        fx.run(&["cleanext", ".pyc"]).unwrap();
        assert!(!project.join("a.pyc").exists());
        assert!(!project.join("src/deep/b.pyc").exists());
        assert!(project.join("src/keep.py").exists());
        assert!(project.join(".git/c.pyc").exists());
    }
}
