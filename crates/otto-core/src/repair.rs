//! Disaster recovery (`otto dr`): rebuild a scope's root document and every
//! pack index from the scripts actually on disk.
//!
//! The scan trusts files over documents. A directory holding a `cmds.json`
//! is a pack named after the directory; a script is a command named after its
//! declaration. Scripts whose file name disagrees with their declaration are
//! renamed, packs left without commands are deleted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use otto_schema::{
    CMDS_FILE, CommandName, ConfigDocument, DocumentError, IndexDocument, PackName, RES_DIR,
    ROOT_FILE, RootDocument,
};
use walkdir::WalkDir;

use crate::pack::{PackDirectory, PackError};
use crate::script;

/// What a repair pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepairReport {
    /// Surviving packs and how many commands each has.
    pub packs: BTreeMap<PackName, usize>,
    /// Scripts renamed to match their declaration, as `(from, to)`.
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Packs deleted because no command survived.
    pub deleted: Vec<PackName>,
    /// Files or directories that were left alone, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Rebuild the scope rooted at `root`.
pub fn repair(root: &Path) -> Result<RepairReport, PackError> {
    let mut report = RepairReport::default();
    let root_document = root.join(ROOT_FILE);

    let mut found = BTreeMap::new();
    for dir in pack_dirs(root) {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match PackName::new(&name) {
            Ok(pack) if !pack.is_base() => {
                if let Some(previous) = found.insert(pack.clone(), dir.clone()) {
                    report
                        .skipped
                        .push((previous, format!("duplicate pack name '{pack}'")));
                }
            }
            _ => report
                .skipped
                .push((dir, format!("'{name}' is not a usable pack name"))),
        }
    }

    let mut packs = BTreeMap::new();
    for (pack, dir) in found {
        let pack_dir = PackDirectory::at(pack.clone(), &dir, &root_document)?;
        let count = rebuild_index(&pack_dir, &mut report)?;
        if count == 0 {
            fs::remove_dir_all(&dir).map_err(|source| PackError::Io {
                path: dir.clone(),
                source,
            })?;
            tracing::info!("Deleted empty pack {pack}");
            report.deleted.push(pack);
        } else {
            report.packs.insert(pack.clone(), count);
            packs.insert(pack, pack_dir.dir().to_path_buf());
        }
    }

    let mut document = match ConfigDocument::<RootDocument>::open_or_default(&root_document) {
        Ok(document) => document,
        Err(e @ DocumentError::Parse { .. }) => {
            tracing::warn!("Replacing unreadable root document: {e}");
            report
                .skipped
                .push((root_document.clone(), "unreadable, settings reset".to_string()));
            ConfigDocument::create(&root_document, RootDocument::default())
        }
        Err(e) => return Err(e.into()),
    };
    if document.packs == packs && root_document.is_file() {
        document.discard();
    } else {
        document.packs = packs;
        document.commit()?;
    }

    Ok(report)
}

/// Directories under `root` holding an index document. Hidden directories
/// (in-progress installs) and `res/` are not searched.
fn pack_dirs(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !(e.file_type().is_dir() && (name.starts_with('.') || (e.depth() == 1 && name == RES_DIR)))
        })
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == CMDS_FILE)
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .filter(|dir| dir != root)
        .collect()
}

/// Rewrite a pack's index from its scripts. Returns the number of commands.
fn rebuild_index(pack: &PackDirectory, report: &mut RepairReport) -> Result<usize, PackError> {
    let mut index = IndexDocument::default();

    for path in pack.scripts()? {
        let Ok(source) = fs::read_to_string(&path) else {
            report.skipped.push((path, "not a text file".to_string()));
            continue;
        };
        let Some(command) = script::declared_symbol(&source)
            .and_then(|symbol| CommandName::from_symbol(&symbol).ok())
        else {
            report.skipped.push((path, "no command declaration".to_string()));
            continue;
        };
        if index.contains(&command) {
            report
                .skipped
                .push((path, format!("'{command}' is already declared")));
            continue;
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let expected = if ext.is_empty() {
            pack.dir().join(command.as_str())
        } else {
            pack.dir().join(command.file_name(&ext))
        };

        let path = if path == expected {
            path
        } else if expected.exists() {
            report.skipped.push((
                path,
                format!("declares '{command}' but {} exists", expected.display()),
            ));
            continue;
        } else {
            fs::rename(&path, &expected).map_err(|source| PackError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!("Renamed {} to {}", path.display(), expected.display());
            report.renamed.push((path, expected.clone()));
            expected
        };

        index.insert(command, path);
    }

    let count = index.len();
    match ConfigDocument::<IndexDocument>::open_or_default(pack.index_path()) {
        Ok(document) if *document == index => document.discard(),
        Ok(mut document) => {
            *document = index;
            document.commit()?;
        }
        Err(e) => {
            tracing::warn!("Replacing unreadable index: {e}");
            ConfigDocument::create(pack.index_path(), index).commit()?;
        }
    }
    Ok(count)
}
