//! CLI command definitions and dispatch.
//!
//! Without a subcommand the arguments are `<SOURCE>... <TARGET>` and a
//! mirror run is started. Helper subcommands live in their own submodules:
//! - `mirror`: the mirror run itself, with confirmation and summary
//! - `index`: inspecting and rebuilding the destination index
//! - `tools`: checking that the external programs can be found
//! - `config`: printing or initialising the configuration file

mod config;
mod index;
mod mirror;
mod tools;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::Config;

pub use config::cmd_config;
pub use index::{cmd_index, cmd_rebuild_index};
pub use mirror::cmd_mirror;
pub use tools::cmd_check_tools;

/// Mirror music folders into a lossy copy: lossy files and artwork are copied,
/// lossless files are transcoded, and an index in the target directory
/// remembers what is already there.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Source directories followed by the target directory.
    /// A first directory named like a subcommand must be written as `./index`
    #[arg(value_name = "DIR")]
    pub paths: Vec<PathBuf>,

    /// Don't ask for confirmation before mirroring
    #[arg(short, long)]
    pub yes: bool,

    /// Summary format
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub format: SummaryFormat,

    /// Configuration file (defaults to the OS config directory)
    #[arg(long, env = "LOSSY_MIRROR_CONFIG")]
    pub config: Option<PathBuf>,
}

/// How the run summary is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Text,
    Json,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Check that the transcoder and copy utility are installed
    CheckTools,
    /// Throw away the index of a target directory and rebuild it from its contents
    RebuildIndex {
        /// Target directory
        target: PathBuf,
    },
    /// Show the index of a target directory
    Index {
        /// Target directory
        target: PathBuf,
        /// Print every entry
        #[arg(short, long)]
        list: bool,
        /// Check whether a relative path (e.g. /Album/track.ogg) is indexed
        #[arg(long)]
        contains: Option<String>,
    },
    /// Print the effective configuration
    Config {
        /// Write a default configuration file instead
        #[arg(long)]
        init: bool,
    },
}

/// Run the command line.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::CheckTools) => cmd_check_tools(&load_config(cli.config.as_deref())?),
        Some(Commands::RebuildIndex { target }) => {
            cmd_rebuild_index(&load_config(cli.config.as_deref())?, target)
        }
        Some(Commands::Index {
            target,
            list,
            contains,
        }) => cmd_index(
            &load_config(cli.config.as_deref())?,
            target,
            *list,
            contains.as_deref(),
        ),
        // The file to initialise usually does not exist yet
        Some(Commands::Config { init: true }) => {
            cmd_config(&Config::default(), cli.config.as_deref(), true)
        }
        Some(Commands::Config { init: false }) => {
            cmd_config(&load_config(cli.config.as_deref())?, cli.config.as_deref(), false)
        }
        None => {
            if cli.paths.len() < 2 {
                Cli::command().print_help()?;
                anyhow::bail!("expected at least one source directory and a target directory");
            }
            let config = load_config(cli.config.as_deref())?;
            cmd_mirror(&config, &cli.paths, cli.yes, cli.format)
        }
    }
}

/// An explicit config file must load; the default location falls back to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(crate::config::load_from(path)?),
        None => Ok(crate::config::load()),
    }
}
