// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Optional TOML configuration.
//!
//! A missing or empty file yields `Config::default()`. Every key is optional.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Placeholder owner email so the iTunes owner block is always complete
pub const DEFAULT_OWNER_EMAIL: &str = "noreply@example.com";
/// Category used when a parsed feed carries none
pub const DEFAULT_CATEGORY: &str = "Technology";
pub const DEFAULT_MIME_TYPE: &str = "audio/mpeg";
/// Language assumed for parsed feeds without a `<language>` element
pub const DEFAULT_LANGUAGE: &str = "en";

/// Values the document engine falls back to when a field is not supplied
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedDefaults {
    pub owner_email: String,
    pub category: String,
    pub mime_type: String,
    pub language: String,
}

impl Default for FeedDefaults {
    fn default() -> Self {
        Self {
            owner_email: DEFAULT_OWNER_EMAIL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: FeedDefaults,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_returns_default() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("podforge.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.defaults.owner_email, DEFAULT_OWNER_EMAIL);
    }

    #[test]
    fn empty_file_returns_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("podforge.toml");
        std::fs::write(&path, "  \n").unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn partial_defaults_keep_builtin_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("podforge.toml");
        std::fs::write(&path, "[defaults]\nowner_email = \"feeds@example.org\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.defaults.owner_email, "feeds@example.org");
        assert_eq!(config.defaults.category, DEFAULT_CATEGORY);
        assert_eq!(config.defaults.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(config.defaults.language, DEFAULT_LANGUAGE);
    }

    #[test]
    fn language_default_can_be_overridden() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("podforge.toml");
        std::fs::write(&path, "[defaults]\nlanguage = \"ja\"\n").unwrap();

        assert_eq!(Config::load(&path).unwrap().defaults.language, "ja");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("podforge.toml");
        std::fs::write(&path, "[defaults\n").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
