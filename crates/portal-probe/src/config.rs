//! Configuration for the host probes.
//!
//! Configuration is loaded from `~/.config/portal-probe/probe.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::os::{OPENWRT_MARKER, RELEASE_PATTERN};

/// Configuration for the host probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Directory to probe instead of the OS root, e.g. a mounted image.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Glob pattern naming the release files, relative to the root.
    #[serde(default = "default_release_pattern")]
    pub release_pattern: String,

    /// Text that identifies the distribution, matched case-insensitively.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Largest release file the probe will read, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Give up on the probe after this many milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_release_pattern() -> String {
    RELEASE_PATTERN.to_string()
}

fn default_marker() -> String {
    OPENWRT_MARKER.to_string()
}

fn default_max_file_size() -> u64 {
    portal_walk::MAX_FILE_SIZE
}

fn default_timeout() -> u64 {
    5_000
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            root: None,
            release_pattern: default_release_pattern(),
            marker: default_marker(),
            max_file_size: default_max_file_size(),
            timeout_ms: default_timeout(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "portal-probe")
            .context("Could not determine config directory")?;

        Ok(dirs.config_dir().join("probe.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProbeConfig::default();
        assert_eq!(config.root, None);
        assert_eq!(config.release_pattern, "etc/*release*");
        assert_eq!(config.marker, "openwrt");
        assert_eq!(config.max_file_size, 64 * 1024);
        assert_eq!(config.timeout_ms, 5_000);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
root = "/mnt/image"
release_pattern = "etc/os-release"
marker = "alpine"
max_file_size = 4096
timeout_ms = 250
"#;

        let config: ProbeConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(config.root, Some(PathBuf::from("/mnt/image")));
        assert_eq!(config.release_pattern, "etc/os-release");
        assert_eq!(config.marker, "alpine");
        assert_eq!(config.max_file_size, 4096);
        assert_eq!(config.timeout_ms, 250);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: ProbeConfig = toml::from_str("").expect("parse failed");
        assert_eq!(config, ProbeConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.toml");
        std::fs::write(&path, "marker = \"lede\"\n").unwrap();

        let config = ProbeConfig::load_from(&path).unwrap();
        assert_eq!(config.marker, "lede");
        assert_eq!(config.release_pattern, "etc/*release*");
    }

    #[test]
    fn test_load_from_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.toml");
        std::fs::write(&path, "timeout_ms = \"soon\"\n").unwrap();

        let err = ProbeConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config from"));
    }
}
