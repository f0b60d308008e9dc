//! Shared names and on-disk document formats for otto.
//!
//! Everything that touches a pack's footprint on disk agrees on the types in
//! this crate: the validated name newtypes, the per-pack index document
//! (`cmds.json`), the per-scope root document (`config.json`), and the
//! [`ConfigDocument`] guard used to read, mutate and flush them.

pub mod document;
pub mod names;
pub mod types;

// Re-exports
pub use document::{ConfigDocument, DocumentError};
pub use names::*;
pub use types::*;

/// Name of the reserved pack holding the compiled-in commands.
pub const BASE_PACK: &str = "base";

/// Name of the reserved pack holding the current project's commands.
pub const LOCAL_PACK: &str = "local";

/// Separator between pack and command in a qualified name (`pack:command`).
pub const SEPARATOR: char = ':';

/// File name of the root document found in every scope directory.
pub const ROOT_FILE: &str = "config.json";

/// File name of the index document found in every pack directory.
pub const CMDS_FILE: &str = "cmds.json";

/// Extension of package archives produced by `otto pack`.
pub const PACK_EXT: &str = ".opack";

/// Extension given to newly created command scripts.
pub const SCRIPT_EXT: &str = "sh";

/// Name of the directory (under a scope root) holding the project's scopes.
pub const OTTO_DIR: &str = ".otto";

/// Directory (under a scope root) searched for completion tones.
pub const RES_DIR: &str = "res";

/// Extensions of interpreter-generated artifacts that may sit next to a
/// script and must follow it (or be removed) when it moves.
pub const COMPILED_EXTENSIONS: &[&str] = &["pyc", "pyo"];
