//! The `base` pack - one file per compiled-in command

pub mod clean_ext;
pub mod clone;
pub mod doctor;
pub mod edit;
pub mod gitcheck;
pub mod help;
pub mod install;
pub mod list;
pub mod mv;
pub mod new;
pub mod pack;
pub mod remember;
pub mod rm;
pub mod uninstall;
pub mod wait;

use std::path::Path;
use std::sync::Arc;

use otto_core::{CommandError, CommandHandle, Invocation, ProcessRequest};
use otto_schema::{CommandName, PackName, QualifiedName};

/// Every base command, ready to seed the registry.
pub fn builtins() -> Vec<CommandHandle> {
    vec![
        Arc::new(help::Help),
        Arc::new(list::List),
        Arc::new(new::New),
        Arc::new(edit::Edit),
        Arc::new(mv::Mv),
        Arc::new(rm::Rm),
        Arc::new(remember::Remember),
        Arc::new(clone::ClonePack),
        Arc::new(pack::Pack),
        Arc::new(install::Install),
        Arc::new(uninstall::Uninstall),
        Arc::new(doctor::Doctor),
        Arc::new(clean_ext::CleanExt),
        Arc::new(gitcheck::Gitcheck),
        Arc::new(wait::Wait),
    ]
}

/// Editor used when `$EDITOR` is unset.
const DEFAULT_EDITOR: &str = "vi";

/// Open `path` in `$EDITOR`. The variable may carry arguments
/// (`EDITOR="code --wait"`).
pub(crate) fn edit_file(invocation: &Invocation<'_>, path: &Path) -> Result<(), CommandError> {
    let editor = std::env::var("EDITOR").unwrap_or_default();
    let mut words = editor.split_whitespace();
    let program = words.next().unwrap_or(DEFAULT_EDITOR);

    invocation
        .runner()
        .run(&ProcessRequest::new(program).args(words).arg(path))?;
    Ok(())
}

/// Parse `[pack:]command`, defaulting the pack to `default_pack`.
pub(crate) fn parse_target(
    name: &str,
    default_pack: impl FnOnce() -> PackName,
) -> Result<(PackName, CommandName), CommandError> {
    let qualified: QualifiedName = name.parse()?;
    let pack = qualified.pack.unwrap_or_else(default_pack);
    Ok((pack, qualified.command))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures for exercising base commands without a terminal.

    use std::sync::Arc;

    use otto_core::{
        CommandError, CommandRegistry, DryRunner, Layout, NullReporter, Session,
    };
    use tempfile::TempDir;

    /// A registry seeded with every base command, rooted in a temp dir.
    pub(crate) struct Fixture {
        pub(crate) tmp: TempDir,
        pub(crate) session: Session,
        pub(crate) runner: Arc<DryRunner>,
        pub(crate) registry: CommandRegistry,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let runner = Arc::new(DryRunner::new());
            let layout = Layout::new(tmp.path().join("global"), tmp.path().join("proj/.otto"));
            let session = Session::new(layout, runner.clone(), Arc::new(NullReporter));
            let mut registry = CommandRegistry::default();
            registry.initialize_base(super::builtins()).unwrap();
            Self {
                tmp,
                session,
                runner,
                registry,
            }
        }

        pub(crate) fn run(&mut self, args: &[&str]) -> Result<(), CommandError> {
            let (name, rest) = args.split_first().unwrap();
            let rest: Vec<String> = rest.iter().map(ToString::to_string).collect();
            self.registry.run(&self.session, name, &rest)
        }

        pub(crate) fn layout(&self) -> &Layout {
            &self.session.layout
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_are_unique_and_valid() {
        let mut names: Vec<String> = builtins().iter().map(|c| c.name().to_string()).collect();
        for name in &names {
            assert!(CommandName::new(name).is_ok(), "{name}");
        }
        names.sort();
        names.dedup();
        assert_eq!(names.len(), builtins().len());
    }

    #[test]
    fn test_parse_target_defaults_pack() {
        let (pack, command) = parse_target("deploy", PackName::local).unwrap();
        assert_eq!((pack.as_str(), command.as_str()), ("local", "deploy"));

        let (pack, command) = parse_target("tools:ping", PackName::local).unwrap();
        assert_eq!((pack.as_str(), command.as_str()), ("tools", "ping"));

        assert!(parse_target("bad name", PackName::local).is_err());
    }
}
