//! The terminal [`Reporter`].
//!
//! Informational lines go to stdout and are dropped with `--quiet`. Warnings
//! and errors always go to stderr.

use crossterm::style::Stylize;
use otto_core::Reporter;

use super::theme::Theme;

#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
    quiet: bool,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
        }
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        println!();
        println!("{} {}", title.bold(), "─".repeat(40).with(self.theme.colors.secondary));
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", self.theme.icons.info.with(self.theme.colors.secondary));
        }
    }

    fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", self.theme.icons.success.with(self.theme.colors.success));
        }
    }

    fn warning(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }

    fn error(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        );
    }
}
