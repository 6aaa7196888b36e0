//! Command-line interface for lossy-mirror.
//!
//! This module provides the mirror run and a few helper commands for
//! inspecting the destination index and the external tools.

mod commands;

pub use commands::{Cli, Commands, run_command};
