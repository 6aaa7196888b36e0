//! Blocking wrapper around external programs with a hard timeout.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// stdout followed by stderr. Media tools print stream info on either.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Runs programs one at a time in a fixed working directory.
///
/// Each invocation is awaited on a private current-thread runtime so the wait
/// can be abandoned on timeout; `kill_on_drop` makes sure the abandoned child
/// is killed rather than left running behind the walk.
pub struct CommandRunner {
    runtime: Runtime,
    working_dir: PathBuf,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(working_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let working_dir = working_dir.into();
        if !working_dir.is_dir() {
            return Err(Error::config(format!(
                "working directory {} does not exist",
                working_dir.display()
            )));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            working_dir,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `program` and return its output whatever the exit status.
    pub fn run(&self, program: &str, args: &[&OsStr]) -> Result<ToolOutput> {
        let command_line = describe(program, args);
        debug!("executing: {}", command_line);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let waited = self
            .runtime
            .block_on(async { tokio::time::timeout(self.timeout, cmd.output()).await });

        let output = match waited {
            Err(_) => {
                warn!("Timed out after {:?}: {}", self.timeout, command_line);
                return Err(Error::ToolTimeout {
                    command: command_line,
                    timeout: self.timeout,
                });
            }
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ToolNotFound {
                    tool: program.to_string(),
                    source: e,
                });
            }
            Ok(Err(e)) => return Err(Error::Io(e).context(format!("running {command_line}"))),
            Ok(Ok(output)) => output,
        };

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run `program`; any non-zero exit or signal termination is an error.
    pub fn run_checked(&self, program: &str, args: &[&OsStr]) -> Result<ToolOutput> {
        let output = self.run(program, args)?;
        if !output.success() {
            return Err(Error::ToolFailed {
                command: describe(program, args),
                status: output.status.to_string(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

fn describe(program: &str, args: &[&OsStr]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::tempdir;

    fn runner(timeout: Duration) -> CommandRunner {
        CommandRunner::new(std::env::temp_dir(), timeout).unwrap()
    }

    fn sh(script: &str) -> [&OsStr; 2] {
        [OsStr::new("-c"), OsStr::new(script)]
    }

    #[test]
    fn test_captures_stdout_and_stderr() {
        let output = runner(Duration::from_secs(10))
            .run("sh", &sh("echo out; echo err >&2"))
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[test]
    fn test_runs_in_working_dir() {
        let dir = tempdir().unwrap();
        let runner = CommandRunner::new(dir.path(), Duration::from_secs(10)).unwrap();
        runner.run_checked("sh", &sh("touch marker")).unwrap();
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_non_zero_exit_is_an_error_when_checked() {
        let runner = runner(Duration::from_secs(10));
        let unchecked = runner.run("sh", &sh("echo nope >&2; exit 3")).unwrap();
        assert!(!unchecked.success());

        let err = runner.run_checked("sh", &sh("echo nope >&2; exit 3")).unwrap_err();
        match err {
            Error::ToolFailed { command, stderr, .. } => {
                assert!(command.starts_with("sh -c"));
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_is_reported() {
        let err = runner(Duration::from_secs(10))
            .run("definitely-not-a-real-tool-3141", &[])
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { ref tool, .. } if tool == "definitely-not-a-real-tool-3141"));
    }

    #[test]
    fn test_timeout_kills_and_reports() {
        let started = Instant::now();
        let err = runner(Duration::from_millis(200))
            .run("sleep", &[OsStr::new("30")])
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_working_dir_is_rejected() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            CommandRunner::new(missing, Duration::from_secs(1)),
            Err(Error::Config(_))
        ));
    }
}
