//! Configuration
//!
//! TOML config persisted under ~/.chatloom/config.toml. Missing files and
//! missing fields fall back to defaults so a fresh install just works.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chat: ChatSettings,
    pub player_heads: HeadSettings,
    pub translate: TranslateSettings,
}

/// Tab display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Messages kept per tab before the oldest is trimmed
    pub max_messages: usize,
    /// Layout width in host units
    pub wrap_width: usize,
    /// Visible lines per page
    pub lines_per_page: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_messages: 1000,
            wrap_width: 80,
            lines_per_page: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadSettings {
    /// Show player heads next to messages
    pub enabled: bool,
    /// Also show the head on wrapped continuation lines
    pub show_on_wrapped: bool,
}

impl Default for HeadSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            show_on_wrapped: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateSettings {
    /// Translate-speak toggle starts enabled
    pub enabled: bool,
    /// Prefix prepended to spoken messages before translation
    pub speak_prefix: String,
}

impl Config {
    /// Default config location: ~/.chatloom/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".chatloom").join("config.toml"))
    }

    /// Load from an explicit path, or the default location
    ///
    /// A missing file yields the default config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                tracing::debug!("no home directory, using default config");
                return Ok(Self::default());
            }
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chat.max_messages, 1000);
        assert_eq!(config.chat.wrap_width, 80);
        assert!(config.player_heads.enabled);
        assert!(!config.translate.enabled);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.chat.wrap_width = 64;
        config.player_heads.enabled = false;
        config.translate.speak_prefix = "en".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.chat.wrap_width, 64);
        assert!(!loaded.player_heads.enabled);
        assert_eq!(loaded.translate.speak_prefix, "en");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.chat.max_messages, 1000);
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chat]\nwrap_width = 50\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.chat.wrap_width, 50);
        assert_eq!(config.chat.max_messages, 1000);
        assert!(config.player_heads.enabled);
    }
}
