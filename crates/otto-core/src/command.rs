//! The `Command` capability and the loaders that produce it.
//!
//! Base commands are compiled into the binary and registered as ready
//! handles. Every other command is registered as a script path and only
//! turned into a handle by a [`CommandLoader`] when it is about to run, so a
//! broken script never affects unrelated commands.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use otto_schema::{CommandName, PackName};

use crate::error::CommandError;
use crate::interrupt::Interrupt;
use crate::paths::Layout;
use crate::process::{ProcessRequest, ProcessRunner};
use crate::registry::CommandRegistry;
use crate::reporter::Reporter;
use crate::script::{LoadError, Script};

/// An executable unit addressable by name.
pub trait Command: Send + Sync + fmt::Debug {
    /// Name the command is registered under.
    fn name(&self) -> &str;

    /// Long-form documentation shown by `otto help <name>`.
    fn docs(&self) -> Option<&str> {
        None
    }

    /// Run the command.
    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError>;
}

/// A resolved, ready-to-run command.
pub type CommandHandle = Arc<dyn Command>;

/// Where a registered command's code lives.
#[derive(Debug, Clone)]
pub enum CodeRef {
    /// Already resolved (compiled-in commands).
    Resolved(CommandHandle),
    /// A script on disk, loaded on demand.
    Path(PathBuf),
}

impl CodeRef {
    /// The script path, if this command lives on disk.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Resolved(_) => None,
            Self::Path(path) => Some(path),
        }
    }
}

/// Process-wide collaborators handed to every command.
#[derive(Clone)]
pub struct Session {
    /// Scope roots.
    pub layout: Layout,
    /// External process capability.
    pub runner: Arc<dyn ProcessRunner>,
    /// User-facing output.
    pub reporter: Arc<dyn Reporter>,
    /// Raised when the user presses Ctrl-C.
    pub interrupt: Interrupt,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("layout", &self.layout)
            .field("runner", &self.runner)
            .field("interrupt", &self.interrupt)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Group the collaborators.
    pub fn new(
        layout: Layout,
        runner: Arc<dyn ProcessRunner>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            layout,
            runner,
            reporter,
            interrupt: Interrupt::new(),
        }
    }

    /// Share `interrupt` with whoever watches for Ctrl-C.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }
}

/// Everything a running command can reach: the registry it was resolved
/// from (for further lookups and refreshes), the session, and its own
/// resolved identity.
#[derive(Debug)]
pub struct Invocation<'a> {
    /// The registry this command was resolved from.
    pub registry: &'a mut CommandRegistry,
    /// Process-wide collaborators.
    pub session: &'a Session,
    /// Pack the command was resolved in.
    pub pack: PackName,
    /// The command's own name.
    pub command: CommandName,
}

impl Invocation<'_> {
    /// Scope roots.
    pub fn layout(&self) -> &Layout {
        &self.session.layout
    }

    /// External process capability.
    pub fn runner(&self) -> &dyn ProcessRunner {
        self.session.runner.as_ref()
    }

    /// User-facing output.
    pub fn reporter(&self) -> &dyn Reporter {
        self.session.reporter.as_ref()
    }

    /// Fails with `Interrupted` once the user has pressed Ctrl-C.
    pub fn check_interrupt(&self) -> Result<(), CommandError> {
        self.session.interrupt.check()
    }

    /// Rebuild the registry's pack tables after the on-disk set changed,
    /// reporting packs that could not be loaded.
    pub fn refresh(&mut self) {
        for warning in self.registry.refresh(&self.session.layout) {
            tracing::warn!("{warning}");
            self.session.reporter.warning(&warning.to_string());
        }
    }

    /// A usage error for this command with the given argument synopsis.
    pub fn usage(&self, synopsis: &str) -> CommandError {
        CommandError::usage(&self.command, synopsis)
    }
}

/// Turns a script path into a runnable command.
pub trait CommandLoader: Send + Sync + fmt::Debug {
    /// Load `command` from `path`.
    ///
    /// Returns `Ok(None)` when the file does not provide the expected
    /// executable unit.
    fn load(&self, command: &CommandName, path: &Path)
    -> Result<Option<CommandHandle>, LoadError>;
}

/// Loads command scripts (see [`crate::script`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptLoader;

impl CommandLoader for ScriptLoader {
    fn load(
        &self,
        command: &CommandName,
        path: &Path,
    ) -> Result<Option<CommandHandle>, LoadError> {
        let script = Script::load(path)?;
        let expected = command.symbol();
        if script.symbol.as_deref() != Some(expected.as_str()) {
            tracing::debug!(
                "{} declares {:?}, expected {expected}",
                path.display(),
                script.symbol
            );
            return Ok(None);
        }
        Ok(Some(Arc::new(ScriptCommand {
            name: command.clone(),
            script,
        })))
    }
}

/// A command backed by a script, run through its interpreter.
#[derive(Debug, Clone)]
pub struct ScriptCommand {
    name: CommandName,
    script: Script,
}

impl ScriptCommand {
    /// The process request that runs this script with `args`.
    pub fn request(&self, invocation: &Invocation<'_>, args: &[String]) -> ProcessRequest {
        let (program, leading) = self
            .script
            .interpreter
            .split_first()
            .map_or((crate::script::DEFAULT_INTERPRETER, &[][..]), |(p, rest)| {
                (p.as_str(), rest)
            });

        ProcessRequest::new(program)
            .args(leading)
            .arg(&self.script.path)
            .args(args)
            .env("OTTO_PACK", invocation.pack.as_str())
            .env("OTTO_COMMAND", invocation.command.as_str())
            .env("OTTO_LOCAL_DIR", invocation.layout().root(crate::Layer::Local))
    }
}

impl Command for ScriptCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn docs(&self) -> Option<&str> {
        self.script.docs.as_deref()
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        if let Some(sig) = &self.script.signature {
            if !sig.accepts(args.len()) {
                return Err(invocation.usage(&sig.to_string()));
            }
        }
        let request = self.request(invocation, args);
        invocation.runner().run(&request)?;
        Ok(())
    }
}
