//! Scope roots and the paths derived from them.

use dirs::home_dir;
use otto_schema::{LOCAL_PACK, OTTO_DIR, RES_DIR, ROOT_FILE};
use std::io;
use std::path::{Path, PathBuf};

/// Returns the global scope root, or None if the user's home cannot be resolved.
///
/// `OTTO_HOME` takes precedence over `~/.otto`.
pub fn try_otto_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("OTTO_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(OTTO_DIR))
}

/// One of the two configuration layers a pack can be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// The user-wide scope (`~/.otto`), home of installed packs.
    Global,
    /// The project scope (`./.otto`), home of the `local` pack.
    Local,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Filesystem locations of the global and local scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    global: PathBuf,
    local: PathBuf,
}

impl Layout {
    /// Build a layout from explicit scope roots.
    pub fn new(global_root: impl Into<PathBuf>, local_root: impl Into<PathBuf>) -> Self {
        Self {
            global: absolutize(&global_root.into()),
            local: absolutize(&local_root.into()),
        }
    }

    /// Discover the layout for the current process: `home` (or `OTTO_HOME`,
    /// or `~/.otto`) for the global scope and `<cwd>/.otto` for the local one.
    pub fn discover(home: Option<PathBuf>) -> io::Result<Self> {
        let global = home.or_else(try_otto_home).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine home directory. Set OTTO_HOME to override.",
            )
        })?;
        let local = std::env::current_dir()?.join(OTTO_DIR);
        Ok(Self::new(global, local))
    }

    /// Root directory of a layer.
    pub fn root(&self, layer: Layer) -> &Path {
        match layer {
            Layer::Global => &self.global,
            Layer::Local => &self.local,
        }
    }

    /// Root document of a layer: `<root>/config.json`.
    pub fn root_document(&self, layer: Layer) -> PathBuf {
        self.root(layer).join(ROOT_FILE)
    }

    /// Default directory for a pack created in a layer: `<root>/<pack>`.
    pub fn pack_dir(&self, layer: Layer, pack: &str) -> PathBuf {
        self.root(layer).join(pack)
    }

    /// The project's private pack directory: `./.otto/local`.
    pub fn local_pack_dir(&self) -> PathBuf {
        self.pack_dir(Layer::Local, LOCAL_PACK)
    }

    /// Resource directory of a layer: `<root>/res`.
    pub fn res_dir(&self, layer: Layer) -> PathBuf {
        self.root(layer).join(RES_DIR)
    }

    /// The project directory the local scope belongs to.
    pub fn project_dir(&self) -> &Path {
        self.local.parent().unwrap_or(&self.local)
    }
}

/// Make a path absolute against the current directory without touching the
/// filesystem. Falls back to the input if the current directory is unknown.
pub fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = Layout::new("/home/me/.otto", "/work/proj/.otto");

        assert_eq!(
            layout.root_document(Layer::Global),
            PathBuf::from("/home/me/.otto/config.json")
        );
        assert_eq!(
            layout.pack_dir(Layer::Global, "tools"),
            PathBuf::from("/home/me/.otto/tools")
        );
        assert_eq!(
            layout.local_pack_dir(),
            PathBuf::from("/work/proj/.otto/local")
        );
        assert_eq!(layout.res_dir(Layer::Local), PathBuf::from("/work/proj/.otto/res"));
        assert_eq!(layout.project_dir(), Path::new("/work/proj"));
    }

    #[test]
    fn test_relative_roots_become_absolute() {
        let layout = Layout::new("global", "local/.otto");
        assert!(layout.root(Layer::Global).is_absolute());
        assert!(layout.root(Layer::Local).is_absolute());
    }
}
