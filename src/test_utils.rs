//! Test utilities and fixtures for lossy-mirror tests.
//!
//! Provides a scripted [`FakeTools`] standing in for ffmpeg and cp, and a
//! helper to lay out small source/destination trees.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{FakeTools, write_file};
//!
//! let tools = FakeTools::new().with_probe_output("Audio: aac");
//! write_file(&source, "Album/01.m4a", b"ftyp");
//! ```

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::process::MediaTools;

/// Which tool operation was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Probe,
    Transcode,
    Copy,
}

/// In-process [`MediaTools`] that behaves like the real tools on a tiny scale.
///
/// - `copy` copies bytes
/// - `transcode` writes a marker plus the source bytes (or nothing, with
///   [`FakeTools::with_empty_output`])
/// - `probe` returns a canned description
///
/// Every call is recorded and can be inspected with [`FakeTools::calls`].
#[derive(Debug, Default)]
pub struct FakeTools {
    probe_output: String,
    empty_output: bool,
    timeout_on: Option<String>,
    fail_on: Option<String>,
    calls: RefCell<Vec<(Op, PathBuf)>>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe_output(mut self, text: &str) -> Self {
        self.probe_output = text.to_string();
        self
    }

    /// Conversions "succeed" but leave a zero-byte file.
    pub fn with_empty_output(mut self) -> Self {
        self.empty_output = true;
        self
    }

    /// Any operation on a source whose path ends with `suffix` times out
    /// after leaving a partial destination file behind.
    pub fn with_timeout_on(mut self, suffix: &str) -> Self {
        self.timeout_on = Some(suffix.to_string());
        self
    }

    /// Any copy or conversion of a source whose path ends with `suffix`
    /// fails with a non-zero exit.
    pub fn with_failure_on(mut self, suffix: &str) -> Self {
        self.fail_on = Some(suffix.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(Op, PathBuf)> {
        self.calls.borrow().clone()
    }

    fn check(&self, op: Op, input: &Path, output: Option<&Path>) -> Result<()> {
        self.calls.borrow_mut().push((op, input.to_path_buf()));
        let name = input.to_string_lossy();
        let command = format!("{op:?} {name}");

        if self.timeout_on.as_deref().is_some_and(|s| name.ends_with(s)) {
            if let Some(output) = output {
                fs::write(output, b"partial").map_err(Error::Io)?;
            }
            return Err(Error::ToolTimeout {
                command,
                timeout: Duration::from_secs(3600),
            });
        }
        if op != Op::Probe && self.fail_on.as_deref().is_some_and(|s| name.ends_with(s)) {
            return Err(Error::ToolFailed {
                command,
                status: "exit status: 1".to_string(),
                stderr: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

impl MediaTools for FakeTools {
    fn probe(&self, input: &Path) -> Result<String> {
        self.check(Op::Probe, input, None)?;
        Ok(self.probe_output.clone())
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        self.check(Op::Transcode, input, Some(output))?;
        if self.empty_output {
            fs::write(output, b"")?;
        } else {
            let mut bytes = b"OggS".to_vec();
            bytes.extend(fs::read(input)?);
            fs::write(output, bytes)?;
        }
        Ok(())
    }

    fn copy(&self, source: &Path, destination: &Path) -> Result<()> {
        self.check(Op::Copy, source, Some(destination))?;
        fs::copy(source, destination)?;
        Ok(())
    }
}

/// Write `contents` to `root/rel`, creating parent directories.
///
/// Returns the full path of the written file.
pub fn write_file(root: &Path, rel: &str, contents: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, contents).expect("Failed to write test file");
    path
}
