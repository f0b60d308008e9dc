//! `otto edit <name>`

use otto_core::{CodeRef, Command, CommandError, Invocation, RegistryError};

use super::edit_file;

/// Open an existing command's script in `$EDITOR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Edit;

impl Command for Edit {
    fn name(&self) -> &str {
        "edit"
    }

    fn docs(&self) -> Option<&str> {
        Some("Open a command's script in $EDITOR.")
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let [name] = args else {
            return Err(invocation.usage("<name>"));
        };

        let (pack, command) = invocation.registry.resolve(name)?;
        if pack.is_base() {
            invocation
                .reporter()
                .info(&format!("Sorry, you can't edit base commands like {command}"));
            return Ok(());
        }

        let path = invocation
            .registry
            .code_ref(&pack, &command)
            .and_then(CodeRef::path)
            .map(std::path::Path::to_path_buf)
            .ok_or_else(|| RegistryError::NotFound { name: name.clone() })?;
        edit_file(invocation, &path)
    }
}

#[cfg(test)]
mod tests {
    use crate::cmd::testing::Fixture;

    #[test]
    fn test_edit_opens_script_but_not_base() {
        let mut fx = Fixture::new();
        fx.run(&["new", "deploy"]).unwrap();
        fx.run(&["edit", "deploy"]).unwrap();
        fx.run(&["edit", "wait"]).unwrap();

        let requests = fx.runner.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].to_string(), requests[1].to_string());
    }
}
