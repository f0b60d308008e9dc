//! External process capability.
//!
//! Everything otto hands to another program (command scripts, the editor,
//! `git`, the tone player) goes through a [`ProcessRunner`], so the rest of
//! the core can be exercised without spawning anything.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Mutex;

use thiserror::Error;

/// Failure modes of an external process.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The program could not be found on `PATH`.
    #[error("{0}: command not found")]
    NotFound(String),

    /// The program was found but could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO failure.
        source: io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{program} exited with status {code}")]
    Failed {
        /// Program that failed.
        program: String,
        /// Its exit code.
        code: i32,
    },

    /// The program was killed by a signal other than an interrupt.
    #[error("{program} was terminated by signal {signal}")]
    Killed {
        /// Program that was killed.
        program: String,
        /// Terminating signal number.
        signal: i32,
    },

    /// The user interrupted the program (Ctrl-C).
    #[error("interrupted")]
    Interrupted,
}

/// A request to run an external program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessRequest {
    /// Program name or path.
    pub program: OsString,
    /// Arguments, not including the program.
    pub args: Vec<OsString>,
    /// Working directory; inherits the caller's when `None`.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables.
    pub env: Vec<(OsString, OsString)>,
}

impl ProcessRequest {
    /// Start a request for `program`.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            ..Self::default()
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run in `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Export an environment variable to the child.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Program name for messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl fmt::Display for ProcessRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Capability to invoke external processes.
pub trait ProcessRunner: Send + Sync + fmt::Debug {
    /// Run to completion with inherited stdio. Blocks until the child exits.
    fn run(&self, request: &ProcessRequest) -> Result<(), ProcessError>;

    /// Run to completion and capture stdout (lossily decoded).
    fn output(&self, request: &ProcessRequest) -> Result<String, ProcessError>;
}

/// Runs processes for real.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(request: &ProcessRequest) -> Result<Command, ProcessError> {
        let program = which::which(&request.program)
            .map_err(|_| ProcessError::NotFound(request.program_name()))?;

        let mut cmd = Command::new(program);
        cmd.args(&request.args);
        if let Some(dir) = &request.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &request.env {
            cmd.env(key, value);
        }
        Ok(cmd)
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, request: &ProcessRequest) -> Result<(), ProcessError> {
        tracing::debug!("Running {request}");
        let status = Self::command(request)?
            .status()
            .map_err(|source| ProcessError::Spawn {
                program: request.program_name(),
                source,
            })?;
        check_status(&request.program_name(), status)
    }

    fn output(&self, request: &ProcessRequest) -> Result<String, ProcessError> {
        tracing::debug!("Capturing {request}");
        let output = Self::command(request)?
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ProcessError::Spawn {
                program: request.program_name(),
                source,
            })?;
        check_status(&request.program_name(), output.status)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// SIGINT, as delivered to a child when the user presses Ctrl-C.
#[cfg(unix)]
const SIGINT: i32 = 2;

fn check_status(program: &str, status: ExitStatus) -> Result<(), ProcessError> {
    if status.success() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            if signal == SIGINT {
                return Err(ProcessError::Interrupted);
            }
            return Err(ProcessError::Killed {
                program: program.to_string(),
                signal,
            });
        }
    }

    Err(ProcessError::Failed {
        program: program.to_string(),
        code: status.code().unwrap_or(-1),
    })
}

/// Records requests instead of running them (`--dry-run`, tests).
///
/// `output` returns an empty string.
#[derive(Debug, Default)]
pub struct DryRunner {
    requests: Mutex<Vec<ProcessRequest>>,
}

impl DryRunner {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests recorded so far, in order.
    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: &ProcessRequest) {
        tracing::info!("Would run: {request}");
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
    }
}

impl ProcessRunner for DryRunner {
    fn run(&self, request: &ProcessRequest) -> Result<(), ProcessError> {
        self.record(request);
        Ok(())
    }

    fn output(&self, request: &ProcessRequest) -> Result<String, ProcessError> {
        self.record(request);
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ProcessRequest::new("sh")
            .arg("/tmp/ping.sh")
            .args(["a", "b"])
            .env("OTTO_PACK", "tools")
            .current_dir("/tmp");

        assert_eq!(req.to_string(), "sh /tmp/ping.sh a b");
        assert_eq!(req.cwd.as_deref(), Some(Path::new("/tmp")));
        assert_eq!(req.env.len(), 1);
    }

    #[test]
    fn test_dry_runner_records() {
        let runner = DryRunner::new();
        runner.run(&ProcessRequest::new("true")).unwrap();
        assert_eq!(runner.output(&ProcessRequest::new("git")).unwrap(), "");

        let recorded = runner.requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[1].program_name(), "git");
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let err = SystemRunner
            .run(&ProcessRequest::new("otto-definitely-not-a-real-program"))
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_is_reported() {
        let err = SystemRunner
            .run(&ProcessRequest::new("sh").args(["-c", "exit 3"]))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Failed { code: 3, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_sigint_child_is_interrupted() {
        let err = SystemRunner
            .run(&ProcessRequest::new("sh").args(["-c", "kill -INT $$"]))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Interrupted));

        let err = SystemRunner
            .run(&ProcessRequest::new("sh").args(["-c", "kill -TERM $$"]))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Killed { signal: 15, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_is_captured() {
        let out = SystemRunner
            .output(&ProcessRequest::new("sh").args(["-c", "echo hello"]))
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }
}
