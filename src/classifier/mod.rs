//! Decides what to do with each entry of a source tree.
//!
//! Classification is pure: the only input that needs I/O, the codec probe
//! for ambiguous containers like `m4a`, is passed in as a closure and only
//! called when the extension requires it.

use crate::config::MirrorConfig;

/// What the mirror engine should do with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// New directory: index it and create it in the destination
    RecordDirectory,
    /// Path already in the index
    SkipAlreadyIndexed,
    /// Zero-length source file, treated as broken
    SkipEmptyFile,
    /// Lossy audio or artwork, copied verbatim
    CopyAsIs,
    /// Lossless audio, transcoded
    Convert,
    /// Extension we don't know how to handle
    SkipUnknownType,
}

/// Extension-only routing, before any probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Copy,
    Convert,
    /// Container whose codec must be probed
    Probe,
    Unknown,
}

/// Facts about an entry needed to classify it.
#[derive(Debug, Clone, Copy)]
pub struct EntryFacts<'a> {
    pub is_dir: bool,
    pub len: u64,
    pub extension: Option<&'a str>,
    pub indexed: bool,
}

/// Extension sets driving the routing.
#[derive(Debug, Clone)]
pub struct ExtensionPolicy {
    copy: Vec<String>,
    convert: Vec<String>,
    probe: Vec<String>,
    aac_marker: String,
}

impl ExtensionPolicy {
    pub fn from_config(config: &MirrorConfig) -> Self {
        let lower = |v: &[String]| -> Vec<String> { v.iter().map(|e| e.to_lowercase()).collect() };
        Self {
            copy: lower(&config.copy_extensions),
            convert: lower(&config.convert_extensions),
            probe: lower(&config.probe_extensions),
            aac_marker: config.aac_marker.clone(),
        }
    }

    /// Route by (already case-folded) extension alone.
    pub fn route(&self, extension: Option<&str>) -> Route {
        let Some(ext) = extension else {
            return Route::Unknown;
        };
        let has = |set: &[String]| set.iter().any(|e| e == ext);
        if has(&self.probe) {
            Route::Probe
        } else if has(&self.copy) {
            Route::Copy
        } else if has(&self.convert) {
            Route::Convert
        } else {
            Route::Unknown
        }
    }

    /// Whether probe output describes an AAC stream.
    pub fn is_aac(&self, probe_output: &str) -> bool {
        probe_output.contains(&self.aac_marker)
    }

    /// Classify an entry. `probe` returns the media tool's inspection output
    /// and is only called for [`Route::Probe`] extensions.
    pub fn classify<E>(
        &self,
        facts: EntryFacts<'_>,
        probe: impl FnOnce() -> Result<String, E>,
    ) -> Result<Decision, E> {
        if facts.is_dir {
            return Ok(if facts.indexed {
                Decision::SkipAlreadyIndexed
            } else {
                Decision::RecordDirectory
            });
        }
        if facts.indexed {
            return Ok(Decision::SkipAlreadyIndexed);
        }
        if facts.len == 0 {
            return Ok(Decision::SkipEmptyFile);
        }
        Ok(match self.route(facts.extension) {
            Route::Copy => Decision::CopyAsIs,
            Route::Convert => Decision::Convert,
            Route::Probe if self.is_aac(&probe()?) => Decision::CopyAsIs,
            Route::Probe => Decision::Convert,
            Route::Unknown => Decision::SkipUnknownType,
        })
    }
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::from_config(&MirrorConfig::default())
    }
}
