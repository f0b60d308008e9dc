//! On-disk document schemas.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{CommandName, PackName};

/// The per-pack index document (`cmds.json`): command name to the absolute
/// path of its script.
///
/// ```json
/// {"cmds": {"ping": "/home/me/.otto/tools/ping.sh"}}
/// ```
///
/// A value may be empty while waiting for a `fix_paths` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Map of command names to script paths.
    #[serde(default)]
    pub cmds: BTreeMap<CommandName, PathBuf>,
}

impl IndexDocument {
    /// Look up a command's script path.
    pub fn get(&self, command: &str) -> Option<&Path> {
        self.cmds.get(command).map(PathBuf::as_path)
    }

    /// Whether the index lists the command.
    pub fn contains(&self, command: &str) -> bool {
        self.cmds.contains_key(command)
    }

    /// Record (or replace) a command's script path.
    pub fn insert(&mut self, command: CommandName, path: PathBuf) -> Option<PathBuf> {
        self.cmds.insert(command, path)
    }

    /// Drop a command from the index.
    pub fn remove(&mut self, command: &str) -> Option<PathBuf> {
        self.cmds.remove(command)
    }

    /// Number of commands listed.
    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    /// Whether the index lists no commands.
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Iterate over `(command, path)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&CommandName, &PathBuf)> {
        self.cmds.iter()
    }
}

/// The per-scope root document (`config.json`), one for the global scope and
/// one for the project-local scope.
///
/// ```json
/// {
///   "packs": {"tools": "/home/me/.otto/tools"},
///   "remember": {"ping": ["localhost"]},
///   "tone": "done.wav"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootDocument {
    /// Packs this scope provides, mapped to their directories.
    #[serde(default)]
    pub packs: BTreeMap<PackName, PathBuf>,

    /// Arguments substituted when a command is invoked without any.
    #[serde(default)]
    pub remember: BTreeMap<String, Vec<String>>,

    /// Sound file (looked up under `res/`) played after a command completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,

    /// Keys this version does not understand, preserved across rewrites.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RootDocument {
    /// Directory registered for a pack, if any.
    pub fn pack_dir(&self, pack: &str) -> Option<&Path> {
        self.packs.get(pack).map(PathBuf::as_path)
    }

    /// Remembered arguments for a command, if any.
    pub fn remembered(&self, command: &str) -> Option<&[String]> {
        self.remember.get(command).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_document() {
        let json = r#"{"cmds": {"ping": "/tmp/tools/ping.sh", "pong": ""}}"#;
        let index: IndexDocument = serde_json::from_str(json).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("ping"), Some(Path::new("/tmp/tools/ping.sh")));
        assert_eq!(index.get("pong"), Some(Path::new("")));
        assert!(!index.contains("missing"));
    }

    #[test]
    fn test_index_rejects_invalid_command_names() {
        let json = r#"{"cmds": {"bad name": "/tmp/x.sh"}}"#;
        assert!(serde_json::from_str::<IndexDocument>(json).is_err());
    }

    #[test]
    fn test_parse_root_document_defaults() {
        let root: RootDocument = serde_json::from_str("{}").unwrap();
        assert!(root.packs.is_empty());
        assert!(root.remember.is_empty());
        assert!(root.tone.is_none());
    }

    #[test]
    fn test_root_document_preserves_unknown_keys() {
        let json = r#"{"packs": {"local": "/p/.otto/local"}, "editor": "nano"}"#;
        let root: RootDocument = serde_json::from_str(json).unwrap();
        assert_eq!(root.pack_dir("local"), Some(Path::new("/p/.otto/local")));

        let out = serde_json::to_value(&root).unwrap();
        assert_eq!(out["editor"], "nano");
        assert!(out.get("tone").is_none());
    }

    #[test]
    fn test_remembered_arguments() {
        let json = r#"{"remember": {"deploy": ["staging", "--fast"]}}"#;
        let root: RootDocument = serde_json::from_str(json).unwrap();
        assert_eq!(
            root.remembered("deploy"),
            Some(&["staging".to_string(), "--fast".to_string()][..])
        );
        assert_eq!(root.remembered("other"), None);
    }
}
