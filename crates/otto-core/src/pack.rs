//! Pack lifecycle: keeping a pack's scripts, its index document and its
//! scope's root document consistent.
//!
//! Every operation checks its preconditions (source files exist, targets are
//! free) before it changes anything on disk.

use std::fs;
use std::path::{Path, PathBuf};

use otto_schema::{
    CMDS_FILE, COMPILED_EXTENSIONS, CommandName, ConfigDocument, DocumentError, IndexDocument,
    PackName, RootDocument, SCRIPT_EXT,
};
use thiserror::Error;

use crate::paths::{Layer, Layout};
use crate::script;

/// Pack lifecycle failures.
#[derive(Error, Debug)]
pub enum PackError {
    /// The `base` pack is compiled in and cannot be changed.
    #[error("Sorry, the base pack is read-only")]
    BaseReadOnly,

    /// `res` holds a scope's tones and cannot be a pack.
    #[error("'{0}' is reserved for tones and can't name a pack")]
    Reserved(PackName),

    /// No root document registers the pack.
    #[error("Couldn't find pack '{0}', are you sure it's installed?")]
    UnknownPack(PackName),

    /// The pack does not define the command.
    #[error("{pack}:{command} doesn't exist")]
    UnknownCommand {
        /// Pack that was searched.
        pack: PackName,
        /// Missing command.
        command: CommandName,
    },

    /// The index lists a command whose script is gone.
    #[error("Couldn't find {} for '{command}', try `otto dr`", path.display())]
    MissingScript {
        /// Command whose script is missing.
        command: CommandName,
        /// Where it was expected.
        path: PathBuf,
    },

    /// The target name is already taken.
    #[error("{pack}:{command} already exists")]
    CommandExists {
        /// Target pack.
        pack: PackName,
        /// Taken command name.
        command: CommandName,
    },

    /// The target directory is already taken.
    #[error("{} already exists", .0.display())]
    DirectoryExists(PathBuf),

    /// A root or index document failed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Filesystem failure.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },

    /// Recursive copy failure.
    #[error("Copy failed from {} to {}: {source}", from.display(), to.display())]
    Copy {
        /// Source directory.
        from: PathBuf,
        /// Destination directory.
        to: PathBuf,
        /// Underlying failure.
        source: fs_extra::error::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PackError + '_ {
    move |source| PackError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A pack's on-disk footprint: its directory, its index document and the
/// root document that registers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackDirectory {
    pack: PackName,
    dir: PathBuf,
    root_document: PathBuf,
}

impl PackDirectory {
    /// The conventional location of `pack` in `layer`: `<root>/<pack>`.
    pub fn new(layout: &Layout, layer: Layer, pack: PackName) -> Result<Self, PackError> {
        if pack.is_base() {
            return Err(PackError::BaseReadOnly);
        }
        if pack.is_res() {
            return Err(PackError::Reserved(pack));
        }
        Ok(Self {
            dir: layout.pack_dir(layer, &pack),
            root_document: layout.root_document(layer),
            pack,
        })
    }

    /// A pack at an explicit directory, registered in `root_document`.
    pub fn at(
        pack: PackName,
        dir: impl Into<PathBuf>,
        root_document: impl Into<PathBuf>,
    ) -> Result<Self, PackError> {
        if pack.is_base() {
            return Err(PackError::BaseReadOnly);
        }
        if pack.is_res() {
            return Err(PackError::Reserved(pack));
        }
        Ok(Self {
            pack,
            dir: crate::paths::absolutize(&dir.into()),
            root_document: root_document.into(),
        })
    }

    /// The registered pack, looked up in the local root document first and
    /// then the global one.
    pub fn find(layout: &Layout, pack: &PackName) -> Result<Option<Self>, PackError> {
        if pack.is_base() {
            return Err(PackError::BaseReadOnly);
        }
        for layer in [Layer::Local, Layer::Global] {
            let root_document = layout.root_document(layer);
            let root = ConfigDocument::<RootDocument>::read_or_default(&root_document)?;
            if let Some(dir) = root.pack_dir(pack) {
                return Self::at(pack.clone(), dir, root_document).map(Some);
            }
        }
        Ok(None)
    }

    /// Like [`Self::find`], but a pack nobody registers yet is placed in the
    /// local layer.
    pub fn find_or_new(layout: &Layout, pack: PackName) -> Result<Self, PackError> {
        match Self::find(layout, &pack)? {
            Some(found) => Ok(found),
            None => Self::new(layout, Layer::Local, pack),
        }
    }

    /// Like [`Self::find`], but an unregistered pack is an error.
    pub fn registered(layout: &Layout, pack: &PackName) -> Result<Self, PackError> {
        Self::find(layout, pack)?.ok_or_else(|| PackError::UnknownPack(pack.clone()))
    }

    /// The pack's name.
    pub fn pack(&self) -> &PackName {
        &self.pack
    }

    /// The pack's directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The root document the pack is registered in.
    pub fn root_document(&self) -> &Path {
        &self.root_document
    }

    /// `<dir>/cmds.json`.
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(CMDS_FILE)
    }

    /// Whether the pack directory exists.
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Open the index document for modification (empty if missing).
    pub fn open_index(&self) -> Result<ConfigDocument<IndexDocument>, PackError> {
        Ok(ConfigDocument::open_or_default(self.index_path())?)
    }

    /// Read the index document (empty if missing).
    pub fn read_index(&self) -> Result<IndexDocument, PackError> {
        Ok(ConfigDocument::read_or_default(&self.index_path())?)
    }

    /// Whether the pack lists no commands.
    pub fn is_empty(&self) -> Result<bool, PackError> {
        Ok(self.read_index()?.is_empty())
    }

    /// Make sure the directory and the index document exist and the pack is
    /// registered. Calling it again changes nothing.
    pub fn touch(&self) -> Result<(), PackError> {
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let index_path = self.index_path();
        if !index_path.is_file() {
            ConfigDocument::create(&index_path, IndexDocument::default()).commit()?;
        }

        if register(&self.root_document, &self.pack, &self.dir)? {
            tracing::info!("Registered {} at {}", self.pack, self.dir.display());
        }
        Ok(())
    }

    /// The path a new script for `command` would be written to.
    pub fn script_path(&self, command: &CommandName) -> PathBuf {
        self.dir.join(command.file_name(SCRIPT_EXT))
    }

    /// Write a new script and list it in the index. The pack is touched
    /// first.
    pub fn add_command(&self, command: &CommandName, contents: &str) -> Result<PathBuf, PackError> {
        let path = self.script_path(command);
        if self.read_index()?.contains(command) || path.exists() {
            return Err(PackError::CommandExists {
                pack: self.pack.clone(),
                command: command.clone(),
            });
        }

        self.touch()?;
        write_script(&path, contents)?;

        let mut index = self.open_index()?;
        index.insert(command.clone(), path.clone());
        index.commit()?;

        tracing::info!("Added {}:{command} at {}", self.pack, path.display());
        Ok(path)
    }

    /// Delete a command's script, its compiled artifacts and its index entry.
    /// A pack left without commands is deleted.
    ///
    /// Returns whether the pack was deleted.
    pub fn remove_command(&self, command: &CommandName) -> Result<bool, PackError> {
        let mut index = self.open_index()?;
        let Some(path) = index.get(command).map(Path::to_path_buf) else {
            index.discard();
            return Err(PackError::UnknownCommand {
                pack: self.pack.clone(),
                command: command.clone(),
            });
        };

        if path.is_file() {
            fs::remove_file(&path).map_err(io_err(&path))?;
        }
        remove_artifacts(&path)?;
        index.remove(command);
        let emptied = index.is_empty();
        index.commit()?;

        tracing::info!("Removed {}:{command}", self.pack);
        if emptied {
            self.delete()?;
        }
        Ok(emptied)
    }

    /// Rewrite every index entry to an absolute, existing path inside the
    /// pack directory. Entries whose script cannot be found are dropped.
    ///
    /// Returns the dropped commands.
    pub fn fix_paths(&self) -> Result<Vec<CommandName>, PackError> {
        let mut index = self.open_index()?;
        let mut fixed = IndexDocument::default();
        let mut dropped = Vec::new();

        for (command, recorded) in index.iter() {
            match locate_script(&self.dir, command, recorded) {
                Some(path) => {
                    fixed.insert(command.clone(), path);
                }
                None => {
                    tracing::warn!("Dropping {}:{command}, no script found", self.pack);
                    dropped.push(command.clone());
                }
            }
        }

        if fixed == *index {
            index.discard();
        } else {
            *index = fixed;
            index.commit()?;
        }
        Ok(dropped)
    }

    /// Copy the whole pack to `dest`, rewrite the copied index to point
    /// inside it, strip compiled artifacts and register `dest`.
    pub fn clone_into(&self, dest: &Self) -> Result<(), PackError> {
        if !self.exists() {
            return Err(PackError::UnknownPack(self.pack.clone()));
        }
        if dest.exists() {
            return Err(PackError::DirectoryExists(dest.dir.clone()));
        }

        fs::create_dir_all(&dest.dir).map_err(io_err(&dest.dir))?;
        fs_extra::dir::copy(
            &self.dir,
            &dest.dir,
            &fs_extra::dir::CopyOptions::new().content_only(true),
        )
        .map_err(|source| PackError::Copy {
            from: self.dir.clone(),
            to: dest.dir.clone(),
            source,
        })?;

        strip_artifacts(&dest.dir)?;
        dest.fix_paths()?;
        dest.touch()?;

        tracing::info!(
            "Cloned {} ({}) to {} ({})",
            self.pack,
            self.dir.display(),
            dest.pack,
            dest.dir.display()
        );
        Ok(())
    }

    /// Remove the pack directory and its root document entry.
    pub fn delete(&self) -> Result<(), PackError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        }
        unregister(&self.root_document, &self.pack)?;
        tracing::info!("Deleted pack {}", self.pack);
        Ok(())
    }

    /// Script files in the pack directory: everything except the index
    /// document and compiled artifacts.
    pub fn scripts(&self) -> Result<Vec<PathBuf>, PackError> {
        let mut scripts = Vec::new();
        if !self.exists() {
            return Ok(scripts);
        }
        for entry in fs::read_dir(&self.dir).map_err(io_err(&self.dir))? {
            let path = entry.map_err(io_err(&self.dir))?.path();
            if path.is_file() && !is_index(&path) && !is_artifact(&path) {
                scripts.push(path);
            }
        }
        scripts.sort();
        Ok(scripts)
    }
}

/// Whether `path` is a compiled artifact (`.pyc`, `.pyo`).
pub fn is_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| COMPILED_EXTENSIONS.contains(&e))
}

fn is_index(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == CMDS_FILE)
}

/// Delete the compiled siblings of a script.
pub fn remove_artifacts(script: &Path) -> Result<(), PackError> {
    for ext in COMPILED_EXTENSIONS {
        let artifact = script.with_extension(ext);
        if artifact.is_file() {
            fs::remove_file(&artifact).map_err(io_err(&artifact))?;
            tracing::debug!("Removed {}", artifact.display());
        }
    }
    Ok(())
}

/// Delete every compiled artifact under `dir`. Returns how many were
/// removed.
pub fn strip_artifacts(dir: &Path) -> Result<usize, PackError> {
    let mut removed = 0;
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry.map_err(|e| PackError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && is_artifact(entry.path()) {
            fs::remove_file(entry.path()).map_err(io_err(entry.path()))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Find `command`'s script inside `dir`: by the recorded file name, then by
/// the conventional `<command>.sh`, then by any script with the command's
/// stem.
pub fn locate_script(dir: &Path, command: &CommandName, recorded: &Path) -> Option<PathBuf> {
    let candidates = [
        recorded.file_name().map(|name| dir.join(name)),
        Some(dir.join(command.file_name(SCRIPT_EXT))),
    ];
    if let Some(found) = candidates
        .into_iter()
        .flatten()
        .find(|p| p.is_file() && !is_artifact(p) && !is_index(p))
    {
        return Some(found);
    }

    let mut by_stem: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && !is_artifact(p)
                && !is_index(p)
                && p.file_stem().is_some_and(|s| s == command.as_str())
        })
        .collect();
    by_stem.sort();
    by_stem.into_iter().next()
}

fn write_script(path: &Path, contents: &str) -> Result<(), PackError> {
    fs::write(path, contents).map_err(io_err(path))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(io_err(path))?;
    }
    Ok(())
}

/// Record `pack → dir` in a root document. Returns whether the document
/// changed.
pub fn register(root_document: &Path, pack: &PackName, dir: &Path) -> Result<bool, PackError> {
    let mut root = ConfigDocument::<RootDocument>::open_or_default(root_document)?;
    if root.pack_dir(pack) == Some(dir) {
        root.discard();
        return Ok(false);
    }
    root.packs.insert(pack.clone(), dir.to_path_buf());
    root.commit()?;
    Ok(true)
}

/// Drop a pack from a root document. Returns whether it was listed.
pub fn unregister(root_document: &Path, pack: &PackName) -> Result<bool, PackError> {
    if !root_document.is_file() {
        return Ok(false);
    }
    let mut root = ConfigDocument::<RootDocument>::open(root_document)?;
    if root.pack_dir(pack).is_none() {
        root.discard();
        return Ok(false);
    }
    root.packs.remove(pack);
    root.commit()?;
    Ok(true)
}

/// Move `src_command` out of `src` into `dest` as `dest_command`.
///
/// The script is moved, its declaration rewritten to the new symbol, its
/// compiled artifacts removed and both indexes updated. A source pack left
/// empty is deleted.
pub fn move_command(
    src: &PackDirectory,
    src_command: &CommandName,
    dest: &PackDirectory,
    dest_command: &CommandName,
) -> Result<PathBuf, PackError> {
    let same_pack = src.dir == dest.dir;
    if same_pack && src_command == dest_command {
        return Err(PackError::CommandExists {
            pack: dest.pack.clone(),
            command: dest_command.clone(),
        });
    }

    let src_index = src.read_index()?;
    let src_path = src_index
        .get(src_command)
        .map(Path::to_path_buf)
        .ok_or_else(|| PackError::UnknownCommand {
            pack: src.pack.clone(),
            command: src_command.clone(),
        })?;
    if !src_path.is_file() {
        return Err(PackError::MissingScript {
            command: src_command.clone(),
            path: src_path,
        });
    }

    let ext = src_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(SCRIPT_EXT);
    let dest_path = dest.dir.join(dest_command.file_name(ext));
    let dest_taken = if same_pack {
        src_index.contains(dest_command)
    } else {
        dest.read_index()?.contains(dest_command)
    };
    if dest_taken || dest_path.exists() {
        return Err(PackError::CommandExists {
            pack: dest.pack.clone(),
            command: dest_command.clone(),
        });
    }

    let source = fs::read_to_string(&src_path).map_err(io_err(&src_path))?;
    let renamed = script::rename_symbol(&source, &dest_command.symbol());

    dest.touch()?;
    write_script(&dest_path, &renamed)?;
    fs::remove_file(&src_path).map_err(io_err(&src_path))?;
    remove_artifacts(&src_path)?;

    let src_emptied = if same_pack {
        let mut index = src.open_index()?;
        index.remove(src_command);
        index.insert(dest_command.clone(), dest_path.clone());
        index.commit()?;
        false
    } else {
        let mut index = src.open_index()?;
        index.remove(src_command);
        let emptied = index.is_empty();
        index.commit()?;

        let mut index = dest.open_index()?;
        index.insert(dest_command.clone(), dest_path.clone());
        index.commit()?;
        emptied
    };

    tracing::info!(
        "Moved {}:{src_command} to {}:{dest_command}",
        src.pack,
        dest.pack
    );
    if src_emptied {
        src.delete()?;
    }
    Ok(dest_path)
}

/// Rename a command within its pack.
pub fn rename_command(
    pack: &PackDirectory,
    old: &CommandName,
    new: &CommandName,
) -> Result<PathBuf, PackError> {
    move_command(pack, old, pack, new)
}

/// Clone `pack` from the project whose local root is `source_root` into
/// `layer` of `layout` as `dest_pack`.
pub fn clone_pack(
    layout: &Layout,
    source_root: &Path,
    pack: &PackName,
    dest_pack: PackName,
    layer: Layer,
) -> Result<PackDirectory, PackError> {
    let source_document = source_root.join(otto_schema::ROOT_FILE);
    let root = ConfigDocument::<RootDocument>::read_or_default(&source_document)?;
    let dir = root
        .pack_dir(pack)
        .ok_or_else(|| PackError::UnknownPack(pack.clone()))?;
    let source = PackDirectory::at(pack.clone(), dir, source_document.clone())?;

    let dest = PackDirectory::new(layout, layer, dest_pack)?;
    source.clone_into(&dest)?;
    Ok(dest)
}
