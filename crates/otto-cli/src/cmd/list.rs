//! `otto list [pack]`

use otto_core::{Command, CommandError, Invocation, RegistryError};

use crate::ui::list::print_listing;

/// List the commands of every pack, or of one pack.
#[derive(Debug, Clone, Copy, Default)]
pub struct List;

impl Command for List {
    fn name(&self) -> &str {
        "list"
    }

    fn docs(&self) -> Option<&str> {
        Some("List every pack and its commands, or only the commands of one pack.")
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        let listings = match args {
            [] => invocation.registry.list(None),
            [pack] => {
                let listings = invocation.registry.list(Some(pack));
                if listings.is_empty() {
                    return Err(RegistryError::NotFound { name: pack.clone() }.into());
                }
                listings
            }
            _ => return Err(invocation.usage("[pack]")),
        };
        print_listing(&listings);
        Ok(())
    }
}
