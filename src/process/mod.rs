//! External process invocation.
//!
//! - [`CommandRunner`]: runs one program at a time with a timeout, capturing output
//! - [`MediaTools`]: probe / transcode / copy, the seam the mirror engine uses
//! - [`ExternalTools`]: the real implementation on top of ffmpeg and cp

mod runner;
mod tools;

pub use runner::{CommandRunner, ToolOutput};
pub use tools::{ExternalTools, MediaTools};
