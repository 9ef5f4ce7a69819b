use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reducer::REHYDRATE;

/// Error raised while building a state manager from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No schema version was configured, or it was zero.
    #[error("a positive schema version is required")]
    MissingVersion,
    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Build flavour. Production silences the development advisories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Advisories about unversioned or drifting state are logged.
    Development,
    /// Only the migration plan and errors are logged.
    Production,
}

impl Default for BuildMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }
}

/// Configuration for a state manager.
///
/// ```
/// use rehydrate_kit::Config;
///
/// let config = Config::from_toml_str("version = 3\ndebug = true").unwrap();
/// assert_eq!(config.validate().unwrap(), 3);
/// assert!(config.log);
/// assert!(config.debug);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Current schema version. Required and positive.
    #[serde(default)]
    pub version: Option<u32>,
    /// Log the migration plan, errors and development advisories.
    #[serde(default = "default_log")]
    pub log: bool,
    /// Log every migration step and per-key reconciliation outcome.
    #[serde(default)]
    pub debug: bool,
    /// Build flavour used to gate advisories.
    #[serde(default)]
    pub mode: BuildMode,
    /// Action type that triggers migration and reconciliation.
    #[serde(default = "default_rehydrate_type")]
    pub rehydrate_type: String,
}

fn default_log() -> bool {
    true
}

fn default_rehydrate_type() -> String {
    REHYDRATE.into()
}

impl Config {
    /// Configuration for schema `version` with default options.
    pub fn new(version: u32) -> Self {
        Self {
            version: Some(version),
            ..Self::default()
        }
    }

    /// Parse configuration from a TOML document.
    ///
    /// Omitted options take their defaults. The version is not validated
    /// here; see [`Config::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Enable or disable logging.
    pub fn log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// Enable or disable verbose per-step logging.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the build mode.
    pub fn mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the action type that triggers rehydration.
    pub fn rehydrate_type(mut self, kind: impl Into<String>) -> Self {
        self.rehydrate_type = kind.into();
        self
    }

    /// The configured version, if it is usable.
    pub fn validate(&self) -> Result<u32, ConfigError> {
        match self.version {
            Some(version) if version > 0 => Ok(version),
            _ => Err(ConfigError::MissingVersion),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: None,
            log: default_log(),
            debug: false,
            mode: BuildMode::default(),
            rehydrate_type: default_rehydrate_type(),
        }
    }
}
