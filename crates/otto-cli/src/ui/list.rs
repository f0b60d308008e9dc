//! Pack listing output for `otto`, `otto list` and `otto help`.

use crossterm::style::Stylize;
use otto_core::PackListing;

use super::theme::Theme;

/// Render listings as `* pack` headers followed by `  - command` rows.
pub fn render_listing(listings: &[PackListing]) -> String {
    let theme = Theme::default();
    let mut out = String::new();

    for listing in listings {
        out.push_str(&format!(
            "{} {}\n",
            "*".with(theme.colors.secondary),
            listing.pack.as_str().with(theme.colors.pack_name).bold()
        ));
        for command in &listing.commands {
            out.push_str(&format!(
                "  {} {}\n",
                "-".with(theme.colors.secondary),
                command.as_str().with(theme.colors.command)
            ));
        }
    }
    out
}

pub fn print_listing(listings: &[PackListing]) {
    print!("{}", render_listing(listings));
}

#[cfg(test)]
mod tests {
    use super::*;
    use otto_schema::{CommandName, PackName};

    #[test]
    fn test_render_listing_mentions_every_command() {
        let listings = vec![
            PackListing {
                pack: PackName::base(),
                commands: vec![CommandName::new("help").unwrap()],
            },
            PackListing {
                pack: PackName::local(),
                commands: vec![
                    CommandName::new("build").unwrap(),
                    CommandName::new("deploy").unwrap(),
                ],
            },
        ];

        let text = render_listing(&listings);
        assert_eq!(text.lines().count(), 5);
        for word in ["base", "help", "local", "build", "deploy"] {
            assert!(text.contains(word));
        }
    }
}
