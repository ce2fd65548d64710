use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// How a selection captured at an older state is repaired while it is carried
/// forward through the mutation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixPolicy {
    /// Only apply the recorded transforms.
    NoFix,
    /// Normalize after every replayed mutation.
    FixEvery,
    /// Normalize once against the destination state.
    #[default]
    FixAtEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound on repeated normalizer passes when the host fix hook keeps
    /// rewriting selection ranges.
    pub max_selection_fix_passes: usize,
    pub time_travel_fix_policy: FixPolicy,
    /// Locale handed to the segmentation provider.
    pub locale: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_selection_fix_passes: 16,
            time_travel_fix_policy: FixPolicy::default(),
            locale: "en".to_string(),
        }
    }
}

impl Settings {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let settings: Settings =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(settings))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load from the default location, falling back to defaults when no file exists.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/folio");
        PathBuf::from(config_dir.as_ref()).join("settings.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Settings::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/folio/settings.toml"));
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let original = Settings {
            max_selection_fix_passes: 4,
            time_travel_fix_policy: FixPolicy::FixEvery,
            locale: "de".to_string(),
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Settings = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = toml::from_str("locale = \"fr\"").unwrap();

        assert_eq!(settings.locale, "fr");
        assert_eq!(settings.max_selection_fix_passes, 16);
        assert_eq!(settings.time_travel_fix_policy, FixPolicy::FixAtEnd);
    }

    #[test]
    fn test_fix_policy_uses_snake_case() {
        let settings: Settings = toml::from_str("time_travel_fix_policy = \"no_fix\"").unwrap();
        assert_eq!(settings.time_travel_fix_policy, FixPolicy::NoFix);
    }

    #[test]
    fn test_load_from_nonexistent_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = Settings::load_from_path(&config_path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let original = Settings {
            max_selection_fix_passes: 2,
            ..Settings::default()
        };
        original.save_to_path(&config_path).unwrap();

        let loaded = Settings::load_from_path(&config_path).unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        std::fs::write(&config_path, "max_selection_fix_passes = \"many\"").unwrap();

        let err = Settings::load_from_path(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }
}
