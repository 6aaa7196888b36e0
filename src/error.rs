//! Application-wide error types.
//!
//! Library modules return [`Error`] via the crate [`Result`] alias, while the
//! CLI/main layer uses `anyhow` for convenient error propagation.
//!
//! # Categories
//!
//! - Fatal: [`Error::Io`], [`Error::Walk`], [`Error::ToolNotFound`],
//!   [`Error::ToolFailed`] abort the mirror run.
//! - Recorded: [`Error::ToolTimeout`] is caught by the mirror engine, counted
//!   in the report and the entry is retried on the next run.
//!
//! # Example
//!
//! ```ignore
//! use lossy_mirror::error::{Result, ResultExt};
//!
//! fn read_index(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(format!("reading {}", path.display()))
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A directory could not be read while walking a tree
    #[error("Could not read directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// External program could not be started
    #[error("Could not start `{tool}`, is it installed and on PATH? ({source})")]
    ToolNotFound {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// External program exited unsuccessfully
    #[error("ERROR running command: {command} ({status}): {stderr}")]
    ToolFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// External program did not finish in time and was killed
    #[error("Command timed out after {}s: {command}", .timeout.as_secs())]
    ToolTimeout { command: String, timeout: Duration },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a walk error, keeping the directory that failed.
    pub fn walk(source: walkdir::Error) -> Self {
        let path = source.path().map(PathBuf::from).unwrap_or_default();
        Self::Walk { path, source }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error is a timeout, looking through any added context.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::ToolTimeout { .. } => true,
            Self::WithContext { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
