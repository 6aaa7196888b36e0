//! The external media tool (ffmpeg) and copy utility (cp).
//!
//! Copying goes through `cp` rather than `std::fs::copy`: the in-process copy
//! is unreliable when the destination is an MTP mount of a phone.

use std::ffi::OsStr;
use std::path::Path;

use tracing::info;

use super::runner::CommandRunner;
use crate::config::Config;
use crate::error::Result;

/// Operations the mirror engine needs from the outside world.
pub trait MediaTools {
    /// Inspect `input` and return the tool's textual description of it.
    fn probe(&self, input: &Path) -> Result<String>;

    /// Transcode `input` into `output`.
    fn transcode(&self, input: &Path, output: &Path) -> Result<()>;

    /// Copy `source` to `destination` byte for byte.
    fn copy(&self, source: &Path, destination: &Path) -> Result<()>;
}

/// [`MediaTools`] backed by real programs on `PATH`.
pub struct ExternalTools {
    runner: CommandRunner,
    transcoder: String,
    copier: String,
    bitrate: String,
    id3v2_version: String,
}

impl ExternalTools {
    pub fn from_config(config: &Config) -> Result<Self> {
        let runner = CommandRunner::new(&config.tools.working_dir, config.tools.timeout())?;
        Ok(Self {
            runner,
            transcoder: config.tools.transcoder.clone(),
            copier: config.tools.copier.clone(),
            bitrate: config.mirror.bitrate.clone(),
            id3v2_version: config.mirror.id3v2_version.clone(),
        })
    }

    /// First line the transcoder prints for `-version`.
    pub fn transcoder_version(&self) -> Result<String> {
        let output = self
            .runner
            .run_checked(&self.transcoder, &[OsStr::new("-version")])?;
        Ok(output.stdout.lines().next().unwrap_or("unknown").to_string())
    }

    /// Whether the copy utility can be started at all.
    ///
    /// Only spawning matters: not every `cp` understands `--version`.
    pub fn copier_available(&self) -> Result<()> {
        self.runner.run(&self.copier, &[OsStr::new("--version")])?;
        Ok(())
    }

    pub fn transcoder(&self) -> &str {
        &self.transcoder
    }

    pub fn copier(&self) -> &str {
        &self.copier
    }

    fn transcode_args<'a>(&'a self, input: &'a Path, output: &'a Path) -> [&'a OsStr; 9] {
        [
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-vb"),
            OsStr::new(&self.bitrate),
            OsStr::new("-map_metadata"),
            OsStr::new("0"),
            OsStr::new("-id3v2_version"),
            OsStr::new(&self.id3v2_version),
            output.as_os_str(),
        ]
    }
}

impl MediaTools for ExternalTools {
    fn probe(&self, input: &Path) -> Result<String> {
        // Without an output file ffmpeg exits non-zero after printing the
        // stream info, so the status carries no meaning here.
        let output = self
            .runner
            .run(&self.transcoder, &[OsStr::new("-i"), input.as_os_str()])?;
        Ok(output.combined())
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        info!("converting {} to {}", input.display(), output.display());
        self.runner
            .run_checked(&self.transcoder, &self.transcode_args(input, output))?;
        Ok(())
    }

    fn copy(&self, source: &Path, destination: &Path) -> Result<()> {
        info!("copying {} to {}", source.display(), destination.display());
        self.runner.run_checked(
            &self.copier,
            &[OsStr::new("-v"), source.as_os_str(), destination.as_os_str()],
        )?;
        Ok(())
    }
}
