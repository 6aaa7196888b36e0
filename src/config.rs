//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\lossy-mirror\config.toml
//! - macOS: ~/Library/Application Support/lossy-mirror/config.toml
//! - Linux: ~/.config/lossy-mirror/config.toml
//!
//! A different file can be given with `--config` or `LOSSY_MIRROR_CONFIG`.
//! Every field has a default, so the file only needs the settings that
//! differ.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External programs
    pub tools: ToolsConfig,

    /// Mirroring policy
    pub mirror: MirrorConfig,
}

/// External program settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Media tool used for probing and transcoding
    pub transcoder: String,

    /// File copy utility
    pub copier: String,

    /// Working directory for every external invocation
    pub working_dir: PathBuf,

    /// Maximum time a single invocation may run
    pub timeout_secs: u64,
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            transcoder: "ffmpeg".to_string(),
            copier: "cp".to_string(),
            working_dir: std::env::temp_dir(),
            timeout_secs: 60 * 60,
        }
    }
}

/// Mirroring policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Index file name, created inside the target directory
    pub index_file: String,

    /// Extension of transcoded files
    pub target_extension: String,

    /// Transcoder bitrate argument
    pub bitrate: String,

    /// ID3v2 version written by the transcoder
    pub id3v2_version: String,

    /// Extensions copied as is (already lossy, or artwork)
    pub copy_extensions: Vec<String>,

    /// Extensions always transcoded
    pub convert_extensions: Vec<String>,

    /// Extensions whose codec is probed: AAC is copied, anything else converted
    pub probe_extensions: Vec<String>,

    /// Substring of the probe output that marks an AAC stream
    pub aac_marker: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        let strings = |v: &[&str]| -> Vec<String> { v.iter().map(|s| s.to_string()).collect() };
        Self {
            index_file: ".lossy.idx".to_string(),
            target_extension: "ogg".to_string(),
            bitrate: "192k".to_string(),
            id3v2_version: "3".to_string(),
            copy_extensions: strings(&["mp3", "ogg", "aac", "jpg", "jpeg", "png", "gif"]),
            convert_extensions: strings(&["flac", "alac", "aiff"]),
            probe_extensions: strings(&["m4a"]),
            aac_marker: "Audio: aac".to_string(),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lossy-mirror"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit file.
///
/// Unlike [`load`], a missing or malformed file is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config = toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Save configuration to `path`
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)?;
    Ok(path)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[tools]"));
        assert!(toml.contains("[mirror]"));
        assert!(toml.contains("ffmpeg"));
        assert!(toml.contains(".lossy.idx"));
    }

    #[test]
    fn test_defaults_match_mirroring_policy() {
        let config = Config::default();
        assert_eq!(config.tools.timeout(), Duration::from_secs(3600));
        assert_eq!(config.mirror.bitrate, "192k");
        assert_eq!(config.mirror.target_extension, "ogg");
        assert!(config.mirror.copy_extensions.contains(&"jpeg".to_string()));
        assert!(config.mirror.convert_extensions.contains(&"aiff".to_string()));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[tools]
transcoder = "/opt/ffmpeg/bin/ffmpeg"
timeout_secs = 30
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.tools.transcoder, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.tools.timeout(), Duration::from_secs(30));

        // Other fields use defaults
        assert_eq!(config.tools.copier, "cp");
        assert_eq!(config.mirror.index_file, ".lossy.idx");
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.mirror.target_extension = "mp3".to_string();
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.mirror.target_extension, "mp3");
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_load_from_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tools\ntranscoder = ").unwrap();

        assert!(matches!(load_from(&path), Err(ConfigError::Parse(..))));
        assert!(matches!(
            load_from(&dir.path().join("missing.toml")),
            Err(ConfigError::Read(..))
        ));
    }
}
