//! End-to-end tests that drive the `otto` binary.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// A throwaway global scope and project directory for one test.
struct TestContext {
    _temp_dir: TempDir,
    otto_home: PathBuf,
    project: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let otto_home = temp_dir.path().join("global");
        let project = temp_dir.path().join("project");
        fs::create_dir_all(&project).expect("failed to create project dir");

        Self {
            _temp_dir: temp_dir,
            otto_home,
            project,
        }
    }

    fn otto_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_otto"));
        cmd.current_dir(&self.project);
        cmd.env("OTTO_HOME", &self.otto_home);
        cmd.env("EDITOR", "true");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn otto(&self, args: &[&str]) -> Output {
        self.otto_cmd().args(args).output().expect("failed to run otto")
    }

    fn local_pack(&self) -> PathBuf {
        self.project.join(".otto").join("local")
    }

    /// Create a local command whose body echoes its first argument.
    fn new_echo(&self, name: &str) {
        let output = self.otto(&["new", name, "word"]);
        assert!(output.status.success(), "{output:?}");

        let script = self.local_pack().join(format!("{name}.sh"));
        let mut source = fs::read_to_string(&script).unwrap();
        source.push_str("echo \"said-$1\"\n");
        fs::write(&script, source).unwrap();
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_flag() {
    let ctx = TestContext::new();
    let output = ctx.otto(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_version_flag() {
    let ctx = TestContext::new();
    let output = ctx.otto(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("otto"));
}

#[test]
fn test_no_command_lists_base() {
    let ctx = TestContext::new();
    let output = ctx.otto(&[]);
    assert!(output.status.success());

    let out = stdout(&output);
    for word in ["base", "help", "new", "remember", "wait"] {
        assert!(out.contains(word), "missing {word} in {out}");
    }
}

#[test]
fn test_new_then_run_script() {
    let ctx = TestContext::new();
    ctx.new_echo("greet");
    assert!(ctx.local_pack().join("cmds.json").is_file());

    let listing = stdout(&ctx.otto(&["list", "local"]));
    assert!(listing.contains("greet"));

    let output = ctx.otto(&["greet", "hello"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("said-hello"));

    let output = ctx.otto(&["local:greet", "again"]);
    assert!(stdout(&output).contains("said-again"));
}

#[test]
fn test_wrong_arity_is_usage_error() {
    let ctx = TestContext::new();
    ctx.new_echo("greet");

    let output = ctx.otto(&["greet"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("otto greet word"));
}

#[test]
fn test_remembered_arguments() {
    let ctx = TestContext::new();
    ctx.new_echo("greet");

    let output = ctx.otto(&["remember", "greet", "there"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = ctx.otto(&["greet"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("said-there"));

    let output = ctx.otto(&["greet", "explicit"]);
    assert!(stdout(&output).contains("said-explicit"));
}

#[test]
fn test_missing_command_exits_non_zero() {
    let ctx = TestContext::new();
    let output = ctx.otto(&["definitely-missing"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Exiting:"));
    assert!(!ctx.project.join(".otto").exists());
}

#[test]
fn test_dry_run_does_not_execute() {
    let ctx = TestContext::new();
    ctx.new_echo("greet");

    let output = ctx.otto(&["--dry-run", "greet", "hello"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!stdout(&output).contains("said-hello"));
}

#[test]
fn test_failing_script_exits_non_zero() {
    let ctx = TestContext::new();
    let output = ctx.otto(&["new", "broken"]);
    assert!(output.status.success());

    let script = ctx.local_pack().join("broken.sh");
    let mut source = fs::read_to_string(&script).unwrap();
    source.push_str("exit 3\n");
    fs::write(&script, source).unwrap();

    let output = ctx.otto(&["broken"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Exiting:"));
}

#[cfg(unix)]
#[test]
fn test_ctrl_c_waits_for_editor() {
    use std::os::unix::fs::PermissionsExt;
    use std::thread;
    use std::time::Duration;

    let ctx = TestContext::new();
    ctx.new_echo("greet");

    let marker = ctx.project.join("editor-finished");
    let editor = ctx.project.join("slow-editor.sh");
    fs::write(
        &editor,
        format!(
            "#!/bin/sh\ntrap '' INT\nsleep 2\necho done > '{}'\n",
            marker.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&editor, fs::Permissions::from_mode(0o755)).unwrap();

    let mut child = ctx
        .otto_cmd()
        .env("EDITOR", &editor)
        .args(["edit", "greet"])
        .stderr(std::process::Stdio::piped())
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(500));
    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    assert!(marker.exists(), "otto exited before the editor did");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Exiting..."));
}
