//! External tool checks.

use crate::config::Config;
use crate::process::ExternalTools;

/// Check that the transcoder and the copy utility can be started
pub fn cmd_check_tools(config: &Config) -> anyhow::Result<()> {
    println!("Checking external tools...\n");
    let tools = ExternalTools::from_config(config)?;
    let mut missing = false;

    match tools.transcoder_version() {
        Ok(version) => println!("✓ {}: {}", tools.transcoder(), version),
        Err(e) => {
            println!("✗ {}: {}", tools.transcoder(), e);
            println!("  Install ffmpeg: https://ffmpeg.org/download.html");
            missing = true;
        }
    }

    match tools.copier_available() {
        Ok(()) => println!("✓ {}: available", tools.copier()),
        Err(e) => {
            println!("✗ {}: {}", tools.copier(), e);
            missing = true;
        }
    }

    println!();
    println!("Working directory: {:?}", config.tools.working_dir);
    println!("Timeout: {}s", config.tools.timeout_secs);

    if missing {
        anyhow::bail!("required tools are missing");
    }
    Ok(())
}
