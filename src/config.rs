//! Configuration
//!
//! `KilnConfig` is read from `$KILN_CONFIG_PATH` or
//! `<config dir>/kiln/config.toml`. A missing file yields the defaults;
//! missing keys fall back to their defaults individually.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KilnError, Result};

/// Environment variable overriding the configuration path.
pub const CONFIG_PATH_ENV: &str = "KILN_CONFIG_PATH";

/// Two seconds, the customary pause between CD-DA tracks.
pub const DEFAULT_GAP_NS: i64 = 2_000_000_000;

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    pub audio: AudioConfig,
    pub data: DataConfig,
    pub session: SessionConfig,
}

/// Audio editor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Gap given to newly added songs, in nanoseconds.
    pub default_gap_ns: i64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            default_gap_ns: DEFAULT_GAP_NS,
        }
    }
}

/// Data editor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Generate Joliet names (restricts file names).
    pub joliet: bool,

    /// Include hidden files when exploring directories.
    pub include_hidden: bool,

    /// Follow symbolic links when exploring directories.
    pub follow_links: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            joliet: true,
            include_hidden: false,
            follow_links: false,
        }
    }
}

/// Persisted session settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding the session document; platform config dir when unset.
    pub dir: Option<PathBuf>,
}

impl KilnConfig {
    /// Load from the resolved configuration path.
    pub fn load() -> Result<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`, using defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| KilnError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: KilnConfig = toml::from_str(&content).map_err(|e| KilnError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Basic sanity checks.
    pub fn validate(&self) -> Result<()> {
        if self.audio.default_gap_ns < 0 {
            return Err(KilnError::Config {
                path: resolve_config_path().unwrap_or_default(),
                reason: "audio.default_gap_ns must be >= 0".to_string(),
            });
        }
        Ok(())
    }
}

/// `$KILN_CONFIG_PATH`, else `<config dir>/kiln/config.toml`.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(p));
    }
    dirs::config_dir().map(|d| d.join("kiln").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = KilnConfig::default();
        assert_eq!(config.audio.default_gap_ns, DEFAULT_GAP_NS);
        assert!(config.data.joliet);
        assert!(!config.data.include_hidden);
        assert!(config.session.dir.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = KilnConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, KilnConfig::default());
    }

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[data]\njoliet = false\n\n[audio]\ndefault_gap_ns = 0\n",
        )
        .unwrap();

        let config = KilnConfig::load_from(&path).unwrap();
        assert!(!config.data.joliet);
        assert!(!config.data.follow_links);
        assert_eq!(config.audio.default_gap_ns, 0);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[data\njoliet = ").unwrap();

        let err = KilnConfig::load_from(&path).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_negative_gap_is_rejected() {
        let mut config = KilnConfig::default();
        config.audio.default_gap_ns = -1;
        assert!(config.validate().is_err());
    }
}
