//! Lossy Mirror - keep a lossy copy of a music library.
//!
//! Lossy audio and artwork are copied as they are, lossless audio is
//! transcoded with ffmpeg, and an index file in the target directory records
//! what has already been mirrored so repeated runs only do new work.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod mirror;
pub mod process;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lossy_mirror=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    cli::run_command(&args)
}
