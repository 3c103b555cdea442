//! Configuration management for the Redmine CLI.
//!
//! This module handles loading, saving, and resolving connection profiles
//! and application settings from a TOML file.

mod profile;
mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use profile::Profile;
pub use settings::Settings;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "REDMINE_API_KEY";

/// Environment variable holding the password for credential exchange.
pub const PASSWORD_ENV: &str = "REDMINE_PASSWORD";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine configuration directory")]
    NoConfigDir,

    /// The config directory could not be created.
    #[error("failed to create configuration directory: {0}")]
    CreateDirError(#[source] std::io::Error),

    /// The config file could not be read.
    #[error("failed to read configuration file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config file could not be written.
    #[error("failed to write configuration file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The config file is not valid TOML or has the wrong shape.
    #[error("failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A value failed validation.
    #[error("invalid configuration: {0}")]
    ValidationError(String),

    /// The requested profile does not exist.
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The contents of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Application settings.
    #[serde(default)]
    pub settings: Settings,
    /// Connection profiles.
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// Load the configuration from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load the configuration from an explicit path.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;

        debug!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "Loaded config"
        );
        Ok(config)
    }

    /// Save the configuration to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(ConfigError::WriteError)
    }

    /// Validate all profiles and check names are unique.
    pub fn validate(&self) -> Result<()> {
        for (i, profile) in self.profiles.iter().enumerate() {
            profile.validate()?;
            if self.profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }
        Ok(())
    }

    /// Resolve a profile by name, or the default profile when `name` is `None`.
    ///
    /// Without a configured default, a single profile is used implicitly.
    pub fn profile(&self, name: Option<&str>) -> Result<&Profile> {
        let wanted = name.or(self.settings.default_profile.as_deref());

        match wanted {
            Some(wanted) => self
                .profiles
                .iter()
                .find(|p| p.name == wanted)
                .ok_or_else(|| ConfigError::ProfileNotFound(wanted.to_string())),
            None => match self.profiles.as_slice() {
                [only] => Ok(only),
                [] => Err(ConfigError::ValidationError(
                    "no profiles configured; pass --url or add a profile".to_string(),
                )),
                _ => Err(ConfigError::ValidationError(
                    "several profiles configured; pass --profile or set settings.default_profile"
                        .to_string(),
                )),
            },
        }
    }

    /// Add a profile, replacing any profile with the same name.
    ///
    /// The first profile added to an empty config becomes the default.
    pub fn upsert_profile(&mut self, profile: Profile) {
        if self.profiles.is_empty() && self.settings.default_profile.is_none() {
            self.settings.default_profile = Some(profile.name.clone());
        }

        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }
}

/// Path of the config file in the platform config directory.
pub fn config_path() -> Result<PathBuf> {
    let base_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base_dir.join("redmine").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[settings]
default_profile = "work"
days_back = 14

[[profiles]]
name = "work"
url = "https://redmine.example.com"
username = "alice"

[[profiles]]
name = "local"
url = "http://localhost:3000"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();

        assert_eq!(config.settings.default_profile.as_deref(), Some("work"));
        assert_eq!(config.settings.days_back, 14);
        assert_eq!(config.settings.page_size, 100);
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.profiles[1].username, None);
    }

    #[test]
    fn test_profile_resolution() {
        let config: Config = toml::from_str(SAMPLE).unwrap();

        assert_eq!(config.profile(None).unwrap().name, "work");
        assert_eq!(config.profile(Some("local")).unwrap().name, "local");
        assert!(matches!(
            config.profile(Some("missing")),
            Err(ConfigError::ProfileNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_single_profile_is_implicit_default() {
        let config = Config {
            profiles: vec![Profile::new(
                "only".to_string(),
                "https://r.example.com".to_string(),
                None,
            )],
            ..Default::default()
        };
        assert_eq!(config.profile(None).unwrap().name, "only");
    }

    #[test]
    fn test_no_profiles_is_an_error() {
        assert!(Config::default().profile(None).is_err());
    }

    #[test]
    fn test_duplicate_profile_names_rejected() {
        let profile = Profile::new("work".to_string(), "https://r.example.com".to_string(), None);
        let config = Config {
            profiles: vec![profile.clone(), profile],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config: Config = toml::from_str(SAMPLE).unwrap();

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_upsert_profile_replaces_by_name() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.upsert_profile(Profile::new(
            "local".to_string(),
            "http://localhost:8080".to_string(),
            Some("bob".to_string()),
        ));

        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.profiles[1].url, "http://localhost:8080");
        assert_eq!(config.settings.default_profile.as_deref(), Some("work"));
    }

    #[test]
    fn test_first_upserted_profile_becomes_default() {
        let mut config = Config::default();
        config.upsert_profile(Profile::new(
            "work".to_string(),
            "https://r.example.com".to_string(),
            None,
        ));

        assert_eq!(config.settings.default_profile.as_deref(), Some("work"));
        assert_eq!(config.profile(None).unwrap().name, "work");
    }

    #[test]
    fn test_save_rejects_invalid_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.upsert_profile(Profile::new(
            "bad name".to_string(),
            "https://r.example.com".to_string(),
            None,
        ));

        assert!(matches!(
            config.save_to(&path),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "profiles = 3").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_config_path_ends_with_app_dir() {
        let path = config_path().unwrap();
        assert!(path.ends_with("redmine/config.toml"));
    }
}
