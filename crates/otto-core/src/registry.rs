//! The command registry: which commands exist, where, and how a name
//! resolves to exactly one of them.
//!
//! # Resolution
//!
//! A qualified name (`pack:command`) resolves to exactly that pair or fails.
//! A bare name resolves with precedence `local` > installed packs > `base`.
//! When several installed packs define the same bare name, the
//! lexicographically smallest pack name wins.
//!
//! # Invariants
//!
//! - every pack in `commands_by_pack` has at least one command;
//! - every key of `pack_directories` is in `pack_keys`;
//! - `base` never has a directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use otto_schema::{
    CMDS_FILE, CommandName, ConfigDocument, DocumentError, IndexDocument, PackName,
    QualifiedName, RootDocument,
};
use thiserror::Error;

use crate::command::{CodeRef, CommandHandle, CommandLoader, Invocation, ScriptLoader, Session};
use crate::error::CommandError;
use crate::paths::{Layer, Layout};
use crate::script::LoadError;

/// Lookup and loading failures.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No pack defines the requested name.
    #[error("Couldn't lookup {name}, are you sure it's installed?")]
    NotFound {
        /// The name as the user supplied it.
        name: String,
    },

    /// A compiled-in command has a name that is not a valid command name.
    #[error("invalid base command name '{name}'")]
    InvalidBaseCommand {
        /// The offending name.
        name: String,
    },

    /// `initialize_base` was called more than once.
    #[error("the base pack is already initialised")]
    BaseInitialized,

    /// The script behind a command is malformed or unreadable.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The script does not provide the expected executable unit.
    #[error("'{command}' could not be loaded from {}", path.display())]
    Unloadable {
        /// Command that was being loaded.
        command: CommandName,
        /// Script it was loaded from.
        path: PathBuf,
    },
}

/// Recoverable problems met while building the pack tables. The affected
/// pack (or layer) is skipped; everything else still loads.
#[derive(Error, Debug)]
pub enum PackLoadError {
    /// A pack's index document is missing or unreadable.
    #[error("WARNING: {} may be corrupt, please run `otto dr` ({source})", source.path().display())]
    Index {
        /// Pack being loaded.
        pack: PackName,
        /// Underlying document failure.
        source: DocumentError,
    },

    /// A pack's index points at a script that does not exist.
    #[error("WARNING: {} may be corrupt, please run `otto dr` ('{command}' points at missing file {})", index.display(), script.display())]
    MissingScript {
        /// Pack being loaded.
        pack: PackName,
        /// Index document path.
        index: PathBuf,
        /// Command whose script is missing.
        command: CommandName,
        /// The missing path.
        script: PathBuf,
    },

    /// A layer's root document is unreadable.
    #[error("WARNING: {} may be corrupt, please run `otto dr` ({source})", source.path().display())]
    RootDocument {
        /// Layer being read.
        layer: Layer,
        /// Underlying document failure.
        source: DocumentError,
    },

    /// A root document tried to register a reserved pack.
    #[error("WARNING: ignoring '{pack}' listed in the {layer} config")]
    Reserved {
        /// Layer whose document listed it.
        layer: Layer,
        /// The reserved pack.
        pack: PackName,
    },

    /// Something asked to load `base` from disk.
    #[error("WARNING: base is compiled in, ignoring {}", dir.display())]
    BaseFromDisk {
        /// Directory it was to be loaded from.
        dir: PathBuf,
    },
}

/// One pack's entry in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackListing {
    /// Pack name.
    pub pack: PackName,
    /// Its commands in name order.
    pub commands: Vec<CommandName>,
}

impl fmt::Display for PackListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "* {}", self.pack)?;
        for command in &self.commands {
            writeln!(f, "  - {command}")?;
        }
        Ok(())
    }
}

/// In-memory index of every available command.
#[derive(Debug)]
pub struct CommandRegistry {
    pack_keys: BTreeSet<PackName>,
    commands_by_pack: BTreeMap<PackName, BTreeMap<CommandName, CodeRef>>,
    pack_directories: BTreeMap<PackName, PathBuf>,
    loader: Box<dyn CommandLoader>,
    base_initialized: bool,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(Box::new(ScriptLoader))
    }
}

impl CommandRegistry {
    /// Create an empty registry that loads pack commands with `loader`.
    pub fn new(loader: Box<dyn CommandLoader>) -> Self {
        Self {
            pack_keys: BTreeSet::new(),
            commands_by_pack: BTreeMap::new(),
            pack_directories: BTreeMap::new(),
            loader,
            base_initialized: false,
        }
    }

    /// Seed the `base` pack with the compiled-in commands. Must be called
    /// exactly once, before any lookup.
    pub fn initialize_base(
        &mut self,
        builtins: impl IntoIterator<Item = CommandHandle>,
    ) -> Result<(), RegistryError> {
        if self.base_initialized {
            return Err(RegistryError::BaseInitialized);
        }

        let mut commands = BTreeMap::new();
        for handle in builtins {
            let name = CommandName::new(handle.name()).map_err(|_| {
                RegistryError::InvalidBaseCommand {
                    name: handle.name().to_string(),
                }
            })?;
            commands.insert(name, CodeRef::Resolved(handle));
        }

        let base = PackName::base();
        self.pack_keys.insert(base.clone());
        if !commands.is_empty() {
            self.commands_by_pack.insert(base, commands);
        }
        self.base_initialized = true;
        Ok(())
    }

    /// Register every command listed in `dir`'s index document under `pack`,
    /// replacing any previous registration of that pack.
    ///
    /// Every referenced script is checked before anything is registered: on
    /// failure the registry is left exactly as it was.
    pub fn load_pack(&mut self, pack: PackName, dir: &Path) -> Result<usize, PackLoadError> {
        if pack.is_base() {
            return Err(PackLoadError::BaseFromDisk {
                dir: dir.to_path_buf(),
            });
        }

        let index_path = dir.join(CMDS_FILE);
        let index = ConfigDocument::<IndexDocument>::read(&index_path).map_err(|source| {
            PackLoadError::Index {
                pack: pack.clone(),
                source,
            }
        })?;

        let mut commands = BTreeMap::new();
        for (command, path) in index.iter() {
            if !path.is_file() {
                return Err(PackLoadError::MissingScript {
                    pack,
                    index: index_path,
                    command: command.clone(),
                    script: path.clone(),
                });
            }
            commands.insert(command.clone(), CodeRef::Path(path.clone()));
        }

        let count = commands.len();
        self.forget_pack(&pack);
        self.pack_keys.insert(pack.clone());
        self.pack_directories.insert(pack.clone(), dir.to_path_buf());
        if !commands.is_empty() {
            self.commands_by_pack.insert(pack.clone(), commands);
        }
        tracing::debug!("Loaded {count} commands from {pack} ({})", dir.display());
        Ok(count)
    }

    /// Drop a pack from every table. `base` cannot be forgotten.
    pub fn forget_pack(&mut self, pack: &str) -> bool {
        if pack == otto_schema::BASE_PACK {
            return false;
        }
        let known = self.pack_keys.remove(pack);
        self.commands_by_pack.remove(pack);
        self.pack_directories.remove(pack);
        known
    }

    /// Load the packs of both layers: global first, then local. A pack listed
    /// in both is taken from the local layer. Problems are returned as
    /// warnings; affected packs are skipped.
    pub fn populate(&mut self, layout: &Layout) -> Vec<PackLoadError> {
        let mut warnings = Vec::new();

        for layer in [Layer::Global, Layer::Local] {
            let path = layout.root_document(layer);
            let root = match ConfigDocument::<RootDocument>::read_or_default(&path) {
                Ok(root) => root,
                Err(source) => {
                    warnings.push(PackLoadError::RootDocument { layer, source });
                    continue;
                }
            };

            for (pack, dir) in root.packs {
                if pack.is_base() || pack.is_res() || (pack.is_local() && layer == Layer::Global) {
                    warnings.push(PackLoadError::Reserved { layer, pack });
                    continue;
                }
                if let Err(warning) = self.load_pack(pack, &dir) {
                    warnings.push(warning);
                }
            }
        }

        warnings
    }

    /// Rebuild every pack table from disk, keeping `base`.
    pub fn refresh(&mut self, layout: &Layout) -> Vec<PackLoadError> {
        let packs: Vec<PackName> = self
            .pack_keys
            .iter()
            .filter(|p| !p.is_base())
            .cloned()
            .collect();
        for pack in packs {
            self.forget_pack(&pack);
        }
        self.populate(layout)
    }

    /// Packs other than `base` and `local`, in name order.
    pub fn installed_packs(&self) -> impl Iterator<Item = &PackName> {
        self.pack_keys.iter().filter(|p| p.is_installed())
    }

    /// All known pack names.
    pub fn pack_keys(&self) -> &BTreeSet<PackName> {
        &self.pack_keys
    }

    /// A pack's commands.
    pub fn commands(&self, pack: &str) -> Option<&BTreeMap<CommandName, CodeRef>> {
        self.commands_by_pack.get(pack)
    }

    /// Where a command's code lives.
    pub fn code_ref(&self, pack: &str, command: &str) -> Option<&CodeRef> {
        self.commands_by_pack.get(pack)?.get(command)
    }

    /// A pack's directory (`None` for `base` and unknown packs).
    pub fn pack_directory(&self, pack: &str) -> Option<&Path> {
        self.pack_directories.get(pack).map(PathBuf::as_path)
    }

    /// The pack → directory map.
    pub fn export(&self) -> &BTreeMap<PackName, PathBuf> {
        &self.pack_directories
    }

    /// Find the pack a bare command name resolves to.
    pub fn find_pack(&self, command: &str) -> Option<PackName> {
        let defines = |pack: &str| {
            self.commands_by_pack
                .get(pack)
                .is_some_and(|cmds| cmds.contains_key(command))
        };

        if defines(otto_schema::LOCAL_PACK) {
            return Some(PackName::local());
        }
        if let Some(pack) = self.installed_packs().find(|p| defines(p.as_str())) {
            return Some(pack.clone());
        }
        defines(otto_schema::BASE_PACK).then(PackName::base)
    }

    /// Resolve a user-supplied name to exactly one `(pack, command)` pair.
    pub fn resolve(&self, name: &str) -> Result<(PackName, CommandName), RegistryError> {
        let not_found = || RegistryError::NotFound {
            name: name.to_string(),
        };

        let qualified: QualifiedName = name.parse().map_err(|_| not_found())?;
        let pack = match qualified.pack {
            Some(pack) => pack,
            None => self.find_pack(&qualified.command).ok_or_else(not_found)?,
        };

        if self.is_used(&pack, &qualified.command) {
            tracing::debug!("Resolved {name} to {pack}:{}", qualified.command);
            Ok((pack, qualified.command))
        } else {
            Err(not_found())
        }
    }

    /// Whether `pack` defines `command`.
    pub fn is_used(&self, pack: &str, command: &str) -> bool {
        self.code_ref(pack, command).is_some()
    }

    /// Whether `pack:command` is free for a new definition. Never true for
    /// `base`.
    pub fn is_available(&self, pack: &str, command: &str) -> bool {
        pack != otto_schema::BASE_PACK && !self.is_used(pack, command)
    }

    /// Turn a registered command into a runnable handle.
    ///
    /// Base commands are returned as-is; script commands are loaded from the
    /// path recorded for them. `Ok(None)` means the script exists but does not
    /// declare the expected command.
    pub fn load(
        &self,
        pack: &str,
        command: &CommandName,
    ) -> Result<Option<CommandHandle>, RegistryError> {
        let code = self
            .code_ref(pack, command)
            .ok_or_else(|| RegistryError::NotFound {
                name: format!("{pack}:{command}"),
            })?;

        match code {
            CodeRef::Resolved(handle) => Ok(Some(handle.clone())),
            CodeRef::Path(path) => {
                tracing::debug!("Loading {pack}:{command} from {}", path.display());
                let handle = self.loader.load(command, path)?;
                if handle.is_none() {
                    tracing::warn!("'{command}' could not be loaded from {}", path.display());
                }
                Ok(handle)
            }
        }
    }

    /// Resolve, load and run a command.
    pub fn run(
        &mut self,
        session: &Session,
        name: &str,
        args: &[String],
    ) -> Result<(), CommandError> {
        let (pack, command) = self.resolve(name)?;
        let handle = self.load(&pack, &command)?.ok_or_else(|| {
            RegistryError::Unloadable {
                command: command.clone(),
                path: self
                    .code_ref(&pack, &command)
                    .and_then(CodeRef::path)
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            }
        })?;

        let mut invocation = Invocation {
            registry: self,
            session,
            pack,
            command,
        };
        handle.run(&mut invocation, args)
    }

    /// Documentation for a command, titled with its qualified name.
    pub fn docs(&self, name: &str) -> Result<String, RegistryError> {
        let (pack, command) = self.resolve(name)?;
        let full_name = format!("{pack}:{command}");
        let handle = self.load(&pack, &command)?;

        let Some(docs) = handle.as_ref().and_then(|h| h.docs()) else {
            return Ok(format!("{full_name} doesn't seem to have any docs."));
        };
        let body: Vec<&str> = docs.lines().map(str::trim_start).collect();
        Ok(format!(
            "{full_name}\n{}\n{}",
            "=".repeat(full_name.len()),
            body.join("\n")
        ))
    }

    /// Listing of every pack (`base`, installed packs, then `local`), or of
    /// just `pack`.
    pub fn list(&self, pack: Option<&str>) -> Vec<PackListing> {
        let listing = |pack: &PackName| PackListing {
            pack: pack.clone(),
            commands: self
                .commands_by_pack
                .get(pack)
                .map(|cmds| cmds.keys().cloned().collect())
                .unwrap_or_default(),
        };

        if let Some(pack) = pack {
            return self
                .pack_keys
                .get(pack)
                .map(listing)
                .into_iter()
                .collect();
        }

        let mut out = Vec::new();
        out.extend(self.pack_keys.get(otto_schema::BASE_PACK).map(listing));
        out.extend(self.installed_packs().map(listing));
        out.extend(self.pack_keys.get(otto_schema::LOCAL_PACK).map(listing));
        out
    }
}
