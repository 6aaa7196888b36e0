//! Configuration file command.

use std::path::Path;

use crate::config::{self, Config};

/// Print the effective configuration, or write a default file with `--init`
pub fn cmd_config(current: &Config, explicit_path: Option<&Path>, init: bool) -> anyhow::Result<()> {
    if !init {
        print!("{}", toml::to_string_pretty(current)?);
        return Ok(());
    }

    let path = match explicit_path {
        Some(path) => {
            refuse_overwrite(path)?;
            config::save_to(&Config::default(), path)?;
            path.to_path_buf()
        }
        None => {
            if let Some(path) = config::config_path() {
                refuse_overwrite(&path)?;
            }
            config::save(&Config::default())?
        }
    };
    println!("Wrote default configuration to {:?}", path);
    Ok(())
}

fn refuse_overwrite(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{:?} already exists, not overwriting", path);
    }
    Ok(())
}
