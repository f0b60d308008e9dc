//! `otto remember <name> [args ...]`

use otto_core::{Command, CommandError, Invocation, Layer};
use otto_schema::{ConfigDocument, RootDocument};

/// Bind default arguments to a command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Remember;

impl Command for Remember {
    fn name(&self) -> &str {
        "remember"
    }

    fn docs(&self) -> Option<&str> {
        Some(
            "Remember arguments for a command. Running the command without any
            arguments then uses the remembered ones. Remembering nothing forgets
            the binding. Bindings are stored in this project.

              $ otto remember ping localhost
              $ otto ping
              $ otto remember ping",
        )
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let Some((name, remembered)) = args.split_first() else {
            return Err(invocation.usage("<name> [args ...]"));
        };
        invocation.registry.resolve(name)?;

        let path = invocation.layout().root_document(Layer::Local);
        let mut root = ConfigDocument::<RootDocument>::open_or_default(path)?;
        if remembered.is_empty() {
            if root.remembered(name).is_none() {
                root.discard();
                return Ok(());
            }
            root.remember.remove(name.as_str());
            root.commit()?;
            invocation
                .reporter()
                .success(&format!("Forgot the arguments for {name}"));
        } else {
            root.remember.insert(name.clone(), remembered.to_vec());
            root.commit()?;
            invocation.reporter().success(&format!(
                "Remembered `otto {name} {}`",
                remembered.join(" ")
            ));
        }
        Ok(())
    }
}
