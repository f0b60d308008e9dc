//! Top-level orchestration: build the registry from both configuration
//! layers, run the requested command, then play the completion tone.

use std::collections::BTreeMap;
use std::path::PathBuf;

use otto_schema::{ConfigDocument, RootDocument};

use crate::command::{CommandHandle, Session};
use crate::error::CommandError;
use crate::paths::Layer;
use crate::process::ProcessRequest;
use crate::registry::{CommandRegistry, PackListing, PackLoadError};

/// Program used to play the completion tone.
pub const TONE_PLAYER: &str = "aplay";

/// Owns the registry and the session for one process invocation.
#[derive(Debug)]
pub struct Dispatcher {
    registry: CommandRegistry,
    session: Session,
    remember: BTreeMap<String, Vec<String>>,
    tone: Option<String>,
    warnings: Vec<PackLoadError>,
}

impl Dispatcher {
    /// Seed `base` with `builtins`, then load the global and local layers.
    pub fn new(
        session: Session,
        builtins: impl IntoIterator<Item = CommandHandle>,
    ) -> Result<Self, CommandError> {
        let mut registry = CommandRegistry::default();
        registry.initialize_base(builtins)?;
        Ok(Self::with_registry(session, registry))
    }

    /// Load both layers into an already seeded registry.
    pub fn with_registry(session: Session, mut registry: CommandRegistry) -> Self {
        let warnings = registry.populate(&session.layout);
        for warning in &warnings {
            tracing::warn!("{warning}");
            session.reporter.warning(&warning.to_string());
        }

        let mut remember = BTreeMap::new();
        let mut tone = None;
        for layer in [Layer::Global, Layer::Local] {
            let path = session.layout.root_document(layer);
            // Unreadable documents were already reported by `populate`.
            let Ok(root) = ConfigDocument::<RootDocument>::read_or_default(&path) else {
                continue;
            };
            remember.extend(root.remember);
            if root.tone.is_some() {
                tone = root.tone;
            }
        }

        Self {
            registry,
            session,
            remember,
            tone,
            warnings,
        }
    }

    /// The command registry.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Process-wide collaborators.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Packs that were skipped while loading.
    pub fn warnings(&self) -> &[PackLoadError] {
        &self.warnings
    }

    /// Arguments remembered for `name`, local layer first.
    pub fn remembered(&self, name: &str) -> Option<&[String]> {
        self.remember.get(name).map(Vec::as_slice)
    }

    /// The configured completion tone.
    pub fn tone(&self) -> Option<&str> {
        self.tone.as_deref()
    }

    /// Run `name` with `args`. With no arguments, the remembered ones are
    /// used. The completion tone plays after a successful run.
    pub fn handle(&mut self, name: &str, args: &[String]) -> Result<(), CommandError> {
        let args: Vec<String> = match self.remembered(name) {
            Some(remembered) if args.is_empty() => {
                tracing::debug!("Using remembered arguments for {name}: {remembered:?}");
                remembered.to_vec()
            }
            _ => args.to_vec(),
        };

        let interrupt = &self.session.interrupt;
        interrupt.check()?;
        self.registry
            .run(&self.session, name, &args)
            .map_err(|e| {
                if e.is_interrupted() || interrupt.is_raised() {
                    CommandError::Interrupted
                } else {
                    e
                }
            })?;

        // A child that survives Ctrl-C and exits cleanly still ends the run.
        interrupt.check()?;
        self.play_tone()
    }

    /// Listing of every pack, or of just `pack`.
    pub fn list(&self, pack: Option<&str>) -> Vec<PackListing> {
        self.registry.list(pack)
    }

    /// Documentation for a command.
    pub fn docs(&self, name: &str) -> Result<String, CommandError> {
        Ok(self.registry.docs(name)?)
    }

    /// Where the configured tone lives: `res/<tone>` in the local root, then
    /// in the global root.
    pub fn tone_path(&self) -> Result<Option<PathBuf>, CommandError> {
        let Some(tone) = &self.tone else {
            return Ok(None);
        };
        let layout = &self.session.layout;
        [Layer::Local, Layer::Global]
            .into_iter()
            .map(|layer| layout.res_dir(layer).join(tone))
            .find(|path| path.is_file())
            .map(Some)
            .ok_or_else(|| {
                tracing::debug!(
                    "Tried looking for tone at {}",
                    layout.res_dir(Layer::Global).join(tone).display()
                );
                CommandError::ToneNotFound(tone.clone())
            })
    }

    fn play_tone(&self) -> Result<(), CommandError> {
        if let Some(path) = self.tone_path()? {
            self.session
                .runner
                .run(&ProcessRequest::new(TONE_PLAYER).arg("-q").arg(path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, Invocation};
    use crate::paths::Layout;
    use crate::process::DryRunner;
    use crate::reporter::NullReporter;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records the arguments it was run with.
    #[derive(Debug, Default)]
    struct Echo {
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl Command for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn run(&self, _: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
            self.seen.lock().unwrap().push(args.to_vec());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Interrupted;

    impl Command for Interrupted {
        fn name(&self) -> &str {
            "boom"
        }

        fn run(&self, _: &mut Invocation<'_>, _: &[String]) -> Result<(), CommandError> {
            Err(crate::process::ProcessError::Interrupted.into())
        }
    }

    /// Finishes cleanly after the user pressed Ctrl-C, like an editor that
    /// ignores SIGINT.
    #[derive(Debug)]
    struct SurvivesCtrlC;

    impl Command for SurvivesCtrlC {
        fn name(&self) -> &str {
            "edit"
        }

        fn run(&self, invocation: &mut Invocation<'_>, _: &[String]) -> Result<(), CommandError> {
            invocation.session.interrupt.raise();
            Ok(())
        }
    }

    fn setup(tmp: &TempDir) -> (Session, Arc<DryRunner>) {
        let runner = Arc::new(DryRunner::new());
        let layout = Layout::new(tmp.path().join("global"), tmp.path().join("proj/.otto"));
        (
            Session::new(layout, runner.clone(), Arc::new(NullReporter)),
            runner,
        )
    }

    fn write_root(session: &Session, layer: Layer, json: &str) {
        let path = session.layout.root_document(layer);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, json).unwrap();
    }

    #[test]
    fn test_remembered_arguments() {
        let tmp = TempDir::new().unwrap();
        let (session, _) = setup(&tmp);
        write_root(&session, Layer::Global, r#"{"remember": {"echo": ["global"]}}"#);
        write_root(&session, Layer::Local, r#"{"remember": {"echo": ["local", "x"]}}"#);

        let echo = Arc::new(Echo::default());
        let mut dispatcher = Dispatcher::new(session, [echo.clone() as CommandHandle]).unwrap();

        dispatcher.handle("echo", &[]).unwrap();
        dispatcher.handle("echo", &["given".to_string()]).unwrap();

        let seen = echo.seen.lock().unwrap();
        assert_eq!(seen[0], vec!["local", "x"]);
        assert_eq!(seen[1], vec!["given"]);
    }

    #[test]
    fn test_tone_plays_after_success() {
        let tmp = TempDir::new().unwrap();
        let (session, runner) = setup(&tmp);
        write_root(&session, Layer::Global, r#"{"tone": "ding.wav"}"#);
        let tone = session.layout.res_dir(Layer::Global).join("ding.wav");
        fs::create_dir_all(tone.parent().unwrap()).unwrap();
        fs::write(&tone, "RIFF").unwrap();

        let mut dispatcher =
            Dispatcher::new(session, [Arc::new(Echo::default()) as CommandHandle]).unwrap();
        dispatcher.handle("echo", &[]).unwrap();

        let requests = runner.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].to_string(), format!("aplay -q {}", tone.display()));
    }

    #[test]
    fn test_local_tone_wins() {
        let tmp = TempDir::new().unwrap();
        let (session, _) = setup(&tmp);
        write_root(&session, Layer::Local, r#"{"tone": "ding.wav"}"#);
        for layer in [Layer::Global, Layer::Local] {
            let res = session.layout.res_dir(layer);
            fs::create_dir_all(&res).unwrap();
            fs::write(res.join("ding.wav"), "RIFF").unwrap();
        }
        let expected = session.layout.res_dir(Layer::Local).join("ding.wav");

        let dispatcher = Dispatcher::new(session, Vec::<CommandHandle>::new()).unwrap();
        assert_eq!(dispatcher.tone_path().unwrap(), Some(expected));
    }

    #[test]
    fn test_missing_tone_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let (session, _) = setup(&tmp);
        write_root(&session, Layer::Local, r#"{"tone": "nope.wav"}"#);

        let mut dispatcher =
            Dispatcher::new(session, [Arc::new(Echo::default()) as CommandHandle]).unwrap();
        let err = dispatcher.handle("echo", &[]).unwrap_err();
        assert!(matches!(err, CommandError::ToneNotFound(ref t) if t == "nope.wav"));
    }

    #[test]
    fn test_interrupt_is_normalised() {
        let tmp = TempDir::new().unwrap();
        let (session, _) = setup(&tmp);
        let mut dispatcher =
            Dispatcher::new(session, [Arc::new(Interrupted) as CommandHandle]).unwrap();

        let err = dispatcher.handle("boom", &[]).unwrap_err();
        assert!(matches!(err, CommandError::Interrupted));
    }

    #[test]
    fn test_interrupt_during_run_skips_tone() {
        let tmp = TempDir::new().unwrap();
        let (session, runner) = setup(&tmp);
        write_root(&session, Layer::Global, r#"{"tone": "ding.wav"}"#);
        let res = session.layout.res_dir(Layer::Global);
        fs::create_dir_all(&res).unwrap();
        fs::write(res.join("ding.wav"), "RIFF").unwrap();

        let mut dispatcher =
            Dispatcher::new(session, [Arc::new(SurvivesCtrlC) as CommandHandle]).unwrap();
        let err = dispatcher.handle("edit", &[]).unwrap_err();
        assert!(matches!(err, CommandError::Interrupted));
        assert!(runner.requests().is_empty());

        // Later work stops before running anything.
        let err = dispatcher.handle("edit", &[]).unwrap_err();
        assert!(matches!(err, CommandError::Interrupted));
    }

    #[test]
    fn test_unknown_command() {
        let tmp = TempDir::new().unwrap();
        let (session, runner) = setup(&tmp);
        let mut dispatcher = Dispatcher::new(session, Vec::<CommandHandle>::new()).unwrap();

        let err = dispatcher.handle("missing", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Couldn't lookup missing, are you sure it's installed?"
        );
        assert!(runner.requests().is_empty());
    }

    #[test]
    fn test_broken_pack_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let (session, _) = setup(&tmp);
        let broken = tmp.path().join("broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(
            broken.join("cmds.json"),
            format!(r#"{{"cmds": {{"x": "{}"}}}}"#, broken.join("x.sh").display()),
        )
        .unwrap();
        write_root(
            &session,
            Layer::Global,
            &format!(r#"{{"packs": {{"broken": "{}"}}}}"#, broken.display()),
        );

        let dispatcher =
            Dispatcher::new(session, [Arc::new(Echo::default()) as CommandHandle]).unwrap();

        assert_eq!(dispatcher.warnings().len(), 1);
        assert!(dispatcher.list(None).iter().all(|l| l.pack != "broken"));
        assert!(dispatcher.registry().is_used("base", "echo"));
    }
}
