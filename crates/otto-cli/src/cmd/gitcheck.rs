//! `otto gitcheck`

use std::sync::LazyLock;

use otto_core::{Command, CommandError, Invocation, ProcessRequest};
use regex::Regex;

static TODO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\s*TODO").expect("valid regex"));

/// Lines added or removed in `diff` that carry a `# TODO`.
pub fn todo_lines(diff: &str) -> Vec<&str> {
    diff.lines()
        .filter(|line| line.starts_with(['+', '-']) && TODO.is_match(line))
        .collect()
}

/// Look for TODO comments in the staged changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gitcheck;

impl Command for Gitcheck {
    fn name(&self) -> &str {
        "gitcheck"
    }

    fn docs(&self) -> Option<&str> {
        Some("Make sure no `# TODO`s were left behind before committing.")
    }

    fn run(&self, invocation: &mut Invocation<'_>, args: &[String]) -> Result<(), CommandError> {
        if !args.is_empty() {
            return Err(invocation.usage(""));
        }

        let request = ProcessRequest::new("git")
            .args(["diff", "--cached"])
            .current_dir(invocation.layout().project_dir());
        let diff = invocation.runner().output(&request)?;

        let todos = todo_lines(&diff);
        if todos.is_empty() {
            invocation.reporter().success("No TODOs in the staged changes");
            return Ok(());
        }
        invocation
            .reporter()
            .info("The following lines with TODOs were found:");
        for line in todos {
            println!("{line}");
        }
        Ok(())
    }
}
