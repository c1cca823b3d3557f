//! User configuration and preferences

use crate::coordinator::LoadDelays;
use crate::domain::RESULT_LIMIT;
use crate::error::{AppSeekError, Result};
use crate::thumbnail::normalize_extension;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Thumbnail loader pauses, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelaySettings {
    pub settle_ms: u64,
    pub forward_item_ms: u64,
    pub backward_item_ms: u64,
}

impl Default for DelaySettings {
    fn default() -> Self {
        let delays = LoadDelays::default();
        Self {
            settle_ms: delays.settle.as_millis() as u64,
            forward_item_ms: delays.forward_item.as_millis() as u64,
            backward_item_ms: delays.backward_item.as_millis() as u64,
        }
    }
}

impl From<DelaySettings> for LoadDelays {
    fn from(settings: DelaySettings) -> Self {
        Self {
            settle: Duration::from_millis(settings.settle_ms),
            forward_item: Duration::from_millis(settings.forward_item_ms),
            backward_item: Duration::from_millis(settings.backward_item_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Catalog roots: files, or directories listed one level deep
    pub sources: Vec<PathBuf>,
    /// File with one never-cached extension per line
    pub deny_list: Option<PathBuf>,
    /// Directory holding the generic file and folder icons
    pub icons_dir: Option<PathBuf>,
    pub result_limit: usize,
    pub delays: DelaySettings,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            deny_list: None,
            icons_dir: None,
            result_limit: RESULT_LIMIT,
            delays: DelaySettings::default(),
        }
    }
}

impl UserConfig {
    /// Get the config file path (~/.config/appseek/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("appseek").join("config.json"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            AppSeekError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            AppSeekError::ConfigError(format!("Failed to parse config file: {}", e))
        })
    }

    /// Loads the user's config. A broken config is logged and replaced by
    /// defaults; a missing one is created with defaults so it can be edited.
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_or_init(&path),
            None => {
                warn!("Could not determine config directory; using defaults");
                Self::default()
            }
        }
    }

    pub fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            match config.save_to(path) {
                Ok(()) => info!("Wrote default config to {}", path.display()),
                Err(e) => warn!("{}", e),
            }
            return config;
        }

        Self::load_from(path).unwrap_or_else(|e| {
            warn!("{}; using defaults", e);
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppSeekError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AppSeekError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            AppSeekError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }
}

/// Reads the extension deny-list. A missing or unreadable file yields an
/// empty list.
pub fn load_deny_list(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(contents) => parse_deny_list(&contents),
        Err(e) => {
            warn!("Ignoring deny-list {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// One extension per line; a leading dot is optional and `#` starts a comment line
pub fn parse_deny_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_extension)
        .filter(|ext| !ext.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert!(config.sources.is_empty());
        assert_eq!(config.result_limit, RESULT_LIMIT);
        assert_eq!(LoadDelays::from(config.delays), LoadDelays::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = UserConfig {
            sources: vec![PathBuf::from("/usr/share/applications")],
            icons_dir: Some(PathBuf::from("/opt/icons")),
            ..UserConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: UserConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: UserConfig =
            serde_json::from_str(r#"{ "sources": ["/a"], "delays": { "settle_ms": 5 } }"#).unwrap();

        assert_eq!(config.sources, vec![PathBuf::from("/a")]);
        assert_eq!(config.result_limit, RESULT_LIMIT);
        assert_eq!(config.delays.settle_ms, 5);
        assert_eq!(config.delays.backward_item_ms, DelaySettings::default().backward_item_ms);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");
        let config = UserConfig {
            result_limit: 8,
            ..UserConfig::default()
        };

        config.save_to(&path).unwrap();

        assert_eq!(UserConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = UserConfig::load_from(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let result = UserConfig::load_from(&path);

        assert!(matches!(result, Err(AppSeekError::ConfigError(_))));
    }

    #[test]
    fn test_first_run_writes_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("appseek").join("config.json");

        let config = UserConfig::load_or_init(&path);

        assert_eq!(config, UserConfig::default());
        assert_eq!(UserConfig::load_from(&path).unwrap(), UserConfig::default());
    }

    #[test]
    fn test_broken_config_is_kept_and_defaults_used() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = UserConfig::load_or_init(&path);

        assert_eq!(config, UserConfig::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    mod deny_list_tests {
        use super::*;

        #[test]
        fn test_parse_normalizes_lines() {
            let list = parse_deny_list("exe\n.LNK\n\n  # shortcuts\n  Url  \n.\n");
            assert_eq!(list, vec!["exe", "lnk", "url"]);
        }

        #[test]
        fn test_unreadable_deny_list_is_empty() {
            let temp_dir = TempDir::new().unwrap();
            assert!(load_deny_list(&temp_dir.path().join("missing.txt")).is_empty());
        }

        #[test]
        fn test_load_deny_list_from_file() {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("deny.txt");
            fs::write(&path, "ico\r\nexe\r\n").unwrap();

            assert_eq!(load_deny_list(&path), vec!["ico", "exe"]);
        }
    }
}
