//! Application configuration

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Accepted range for `previewLength`
pub const PREVIEW_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 100..=10000;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings: Settings,
    pub library: LibraryConfig,
    pub server: ServerConfig,
    pub watcher: WatcherConfig,
}

/// User-facing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Editor executable; empty means the OS default handler
    pub editor: String,
    pub theme: String,
    /// Maximum number of characters shown in a preview
    pub preview_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            editor: String::new(),
            theme: "light".to_string(),
            preview_length: 1500,
        }
    }
}

/// Partial settings; only the provided keys are applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_length: Option<usize>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.editor.is_none() && self.theme.is_none() && self.preview_length.is_none()
    }
}

impl Settings {
    /// Overlay `update` onto a copy of these settings
    pub fn apply_update(&self, update: SettingsUpdate) -> Settings {
        Settings {
            editor: update.editor.unwrap_or_else(|| self.editor.clone()),
            theme: update.theme.unwrap_or_else(|| self.theme.clone()),
            preview_length: update.preview_length.unwrap_or(self.preview_length),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory restored at startup if it still exists
    pub last_directory: Option<PathBuf>,
    /// Chapter file extension, matched case-insensitively
    pub extension: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            last_directory: None,
            extension: novel_fs::DEFAULT_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub debounce_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

impl AppConfig {
    /// Load configuration from `path`, falling back to defaults
    ///
    /// A broken file is logged and ignored rather than fatal.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("Using default configuration");
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| toml::from_str::<Self>(&content).map_err(anyhow::Error::from));

        match parsed {
            Ok(config) => {
                tracing::info!("Configuration loaded from {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration from {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "NovelShelf", "NovelShelf")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.editor, "");
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.preview_length, 1500);
    }

    #[test]
    fn test_apply_update_overlays_only_given_keys() {
        let old = Settings::default();
        let update = SettingsUpdate {
            theme: Some("dark".into()),
            ..Default::default()
        };

        let new = old.apply_update(update);
        assert_eq!(
            new,
            Settings {
                editor: String::new(),
                theme: "dark".into(),
                preview_length: 1500,
            }
        );
        // Input settings are left as they were
        assert_eq!(old.theme, "light");
    }

    #[test]
    fn test_update_from_partial_json() {
        let update: SettingsUpdate = serde_json::from_str(r#"{"previewLength": 3000}"#).unwrap();
        assert_eq!(update.preview_length, Some(3000));
        assert!(update.theme.is_none());

        let settings: Settings = serde_json::from_str(r#"{"theme": "dark"}"#).unwrap();
        assert_eq!(settings.preview_length, 1500);
        assert_eq!(settings.theme, "dark");
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.settings.theme = "dark".into();
        config.library.last_directory = Some(PathBuf::from("/novels"));
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("previewLength = 1500"));

        assert_eq!(AppConfig::load_from(&path), config);
    }

    #[test]
    fn test_missing_and_broken_files_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AppConfig::load_from(&dir.path().join("none.toml")), AppConfig::default());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "settings = [not toml").unwrap();
        assert_eq!(AppConfig::load_from(&broken), AppConfig::default());
    }
}
