//! Pack archives (`.opack`): gzip-compressed tarballs for sharing packs.
//!
//! ```text
//! <name>.opack
//! └── <name>/
//!     ├── config.json        {"packs": {"<name>": "<name>", "extra": "extra"}}
//!     ├── <name>/            the project's `local` pack, renamed
//!     │   ├── cmds.json      {"cmds": {"build": "<name>/build.sh"}}
//!     │   └── build.sh
//!     └── extra/
//! ```
//!
//! Index values inside an archive are relative to the top-level directory;
//! installing rewrites them to absolute paths under the global root.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use otto_schema::{
    CMDS_FILE, ConfigDocument, DocumentError, IndexDocument, PACK_EXT, PackName, ROOT_FILE,
    RootDocument,
};
use thiserror::Error;

use crate::pack::{PackDirectory, PackError};
use crate::paths::{Layer, Layout};

/// Packaging and installation failures.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive to install does not exist.
    #[error("Couldn't find {}", .0.display())]
    NotFound(PathBuf),

    /// The archive does not hold exactly one top-level directory.
    #[error("{} must contain a single top-level directory", .0.display())]
    Malformed(PathBuf),

    /// An archive entry would land outside the extraction directory.
    #[error("Invalid path in archive: {}", .0.display())]
    UnsafePath(PathBuf),

    /// The pack is already installed.
    #[error("{pack} is already installed at {}, uninstall it first", dir.display())]
    AlreadyInstalled {
        /// Conflicting pack.
        pack: PackName,
        /// Its current directory.
        dir: PathBuf,
    },

    /// The pack is not installed.
    #[error("{0} isn't installed")]
    NotInstalled(PackName),

    /// `base`, `local` and `res` cannot be installed, uninstalled or used
    /// as archive names.
    #[error("'{0}' is reserved")]
    Reserved(PackName),

    /// Two packs would share a name inside the archive.
    #[error("the project already has a pack called '{0}'")]
    Conflict(PackName),

    /// There is nothing to package.
    #[error("No packs to package in {}", .0.display())]
    Empty(PathBuf),

    /// A document inside or outside the archive failed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A pack operation failed.
    #[error(transparent)]
    Pack(#[from] PackError),

    /// Filesystem or archive IO failure.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn installable(pack: &PackName) -> Result<(), ArchiveError> {
    if pack.is_installed() && !pack.is_res() {
        Ok(())
    } else {
        Err(ArchiveError::Reserved(pack.clone()))
    }
}

/// Package every pack of the project's local layer into
/// `<output_dir>/<name>.opack`. The `local` pack is renamed to `name`.
pub fn package(layout: &Layout, name: &PackName, output_dir: &Path) -> Result<PathBuf, ArchiveError> {
    installable(name)?;

    let local_document = layout.root_document(Layer::Local);
    let root = ConfigDocument::<RootDocument>::read_or_default(&local_document)?;
    if root.packs.is_empty() {
        return Err(ArchiveError::Empty(layout.root(Layer::Local).to_path_buf()));
    }
    if root.packs.contains_key(name) {
        return Err(ArchiveError::Conflict(name.clone()));
    }

    let staging = tempfile::Builder::new()
        .prefix(".otto-pack-")
        .tempdir()
        .map_err(io_err(&std::env::temp_dir()))?;
    let top = staging.path().join(name.as_str());
    let staged_document = top.join(ROOT_FILE);

    let mut staged = Vec::new();
    for (pack, dir) in &root.packs {
        let dest_pack = if pack.is_local() {
            name.clone()
        } else {
            pack.clone()
        };
        let dest_dir = top.join(dest_pack.as_str());
        let source = PackDirectory::at(pack.clone(), dir, &local_document)?;
        let dest = PackDirectory::at(dest_pack, dest_dir, &staged_document)?;
        source.clone_into(&dest)?;
        staged.push(dest);
    }

    // Everything inside the archive is relative to the top-level directory.
    let mut packs = RootDocument::default();
    for dest in &staged {
        let mut index = dest.open_index()?;
        let relative: IndexDocument = IndexDocument {
            cmds: index
                .iter()
                .map(|(command, path)| (command.clone(), relative_to(&top, path)))
                .collect(),
        };
        *index = relative;
        index.commit()?;
        packs
            .packs
            .insert(dest.pack().clone(), relative_to(&top, dest.dir()));
    }
    ConfigDocument::create(&staged_document, packs).commit()?;

    fs::create_dir_all(output_dir).map_err(io_err(output_dir))?;
    let output = output_dir.join(format!("{name}{PACK_EXT}"));
    let partial = output.with_extension("opack.tmp");
    write_tarball(&partial, name.as_str(), &top)?;
    fs::rename(&partial, &output).map_err(io_err(&output))?;

    tracing::info!("Packaged {} packs into {}", staged.len(), output.display());
    Ok(output)
}

fn relative_to(base: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
}

fn write_tarball(output: &Path, top_name: &str, top: &Path) -> Result<(), ArchiveError> {
    let file = File::create(output).map_err(io_err(output))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder
        .append_dir_all(top_name, top)
        .map_err(io_err(top))?;
    builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .map_err(io_err(output))?;
    Ok(())
}

/// Extract a gzip-compressed tarball into `dest`, refusing entries that
/// would escape it. Only directories and regular files are extracted.
fn extract(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive).map_err(io_err(archive))?;
    let mut tarball = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    for entry in tarball.entries().map_err(io_err(archive))? {
        let mut entry = entry.map_err(io_err(archive))?;
        let relative = entry.path().map_err(io_err(archive))?.into_owned();

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ArchiveError::UnsafePath(relative));
        }

        let target = dest.join(&relative);
        let kind = entry.header().entry_type();
        if kind.is_dir() {
            fs::create_dir_all(&target).map_err(io_err(&target))?;
            continue;
        }
        if !kind.is_file() {
            tracing::debug!("Skipping non-file entry {}", relative.display());
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        entry.unpack(&target).map_err(io_err(&target))?;
    }
    Ok(())
}

/// Install every pack in `archive` into the global scope.
///
/// All destinations are checked before anything is copied: if any pack is
/// already installed, nothing changes.
pub fn install(layout: &Layout, archive: &Path) -> Result<Vec<PackName>, ArchiveError> {
    if !archive.is_file() {
        return Err(ArchiveError::NotFound(archive.to_path_buf()));
    }

    let global = layout.root(Layer::Global);
    fs::create_dir_all(global).map_err(io_err(global))?;
    let staging = tempfile::Builder::new()
        .prefix(".otto-install-")
        .tempdir_in(global)
        .map_err(io_err(global))?;
    extract(archive, staging.path())?;

    let mut top_level = Vec::new();
    for entry in fs::read_dir(staging.path()).map_err(io_err(staging.path()))? {
        top_level.push(entry.map_err(io_err(staging.path()))?.path());
    }
    let [top] = top_level.as_slice() else {
        return Err(ArchiveError::Malformed(archive.to_path_buf()));
    };
    if !top.is_dir() {
        return Err(ArchiveError::Malformed(archive.to_path_buf()));
    }

    let archive_document = top.join(ROOT_FILE);
    let contents = ConfigDocument::<RootDocument>::read(&archive_document)?;
    let installed = ConfigDocument::<RootDocument>::read_or_default(&layout.root_document(Layer::Global))?;

    let mut plan = Vec::new();
    for (pack, relative) in &contents.packs {
        installable(pack)?;
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ArchiveError::UnsafePath(relative.clone()));
        }
        let source_dir = top.join(relative);
        if !source_dir.join(CMDS_FILE).is_file() {
            return Err(ArchiveError::Malformed(archive.to_path_buf()));
        }

        let dest = PackDirectory::new(layout, Layer::Global, pack.clone())?;
        if let Some(dir) = installed.pack_dir(pack) {
            return Err(ArchiveError::AlreadyInstalled {
                pack: pack.clone(),
                dir: dir.to_path_buf(),
            });
        }
        if dest.exists() {
            return Err(ArchiveError::AlreadyInstalled {
                pack: pack.clone(),
                dir: dest.dir().to_path_buf(),
            });
        }
        let source = PackDirectory::at(pack.clone(), source_dir, &archive_document)?;
        plan.push((source, dest));
    }

    let mut packs = Vec::new();
    for (source, dest) in plan {
        source.clone_into(&dest)?;
        tracing::info!("Installed {} into {}", dest.pack(), dest.dir().display());
        packs.push(dest.pack().clone());
    }
    Ok(packs)
}

/// Remove an installed pack's directory and its global registration.
pub fn uninstall(layout: &Layout, pack: &PackName) -> Result<PathBuf, ArchiveError> {
    installable(pack)?;

    let root_document = layout.root_document(Layer::Global);
    let installed = ConfigDocument::<RootDocument>::read_or_default(&root_document)?;
    let dir = installed
        .pack_dir(pack)
        .ok_or_else(|| ArchiveError::NotInstalled(pack.clone()))?
        .to_path_buf();

    PackDirectory::at(pack.clone(), &dir, root_document)?.delete()?;
    tracing::info!("Uninstalled {pack}");
    Ok(dir)
}
