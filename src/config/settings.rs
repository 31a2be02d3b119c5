//! Persisted settings - motor choice, remote API credentials, UI theme
//!
//! Every section implements `Default`, so a missing or partial file behaves
//! exactly like the stock configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::defaults;
use crate::llm::{BackendAdapter, LocalEndpoints, Motor, RemoteCredentials};

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV_VAR: &str = "REPORT_MASTER_CONFIG";

/// Settings file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "report_master.toml";

// ============================================================================
// Top-Level Settings
// ============================================================================

/// Root settings for a Report-Master deployment.
///
/// Load with `Settings::load()` which searches:
/// 1. `$REPORT_MASTER_CONFIG`
/// 2. `./report_master.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Active motor at startup
    #[serde(default)]
    pub motor: Motor,

    /// Remote API credentials
    #[serde(default)]
    pub remote: RemoteCredentials,

    /// Base URLs of the local motors
    #[serde(default)]
    pub endpoints: LocalEndpoints,

    /// Front-end preferences
    #[serde(default)]
    pub ui: UiSettings,

    /// HTTP server
    #[serde(default)]
    pub server: ServerSettings,
}

impl Settings {
    /// Load settings using the standard search order.
    ///
    /// A file that exists but fails to load is an error. Falling back to
    /// defaults would let the next save overwrite it.
    pub fn load() -> Result<LoadedSettings, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::search(env_path.as_deref(), Path::new(LOCAL_CONFIG_FILE))
    }

    /// Try `env_path`, then `local`, then built-in defaults.
    pub fn search(env_path: Option<&Path>, local: &Path) -> Result<LoadedSettings, ConfigError> {
        if let Some(p) = env_path {
            if p.exists() {
                let settings = Self::load_from_file(p)?;
                info!(path = %p.display(), motor = %settings.motor, "Loaded settings from {CONFIG_ENV_VAR}");
                return Ok(LoadedSettings::from_file(settings, p));
            }
            warn!(path = %p.display(), "{CONFIG_ENV_VAR} points to non-existent file, falling back");
        }

        if local.exists() {
            let settings = Self::load_from_file(local)?;
            info!(path = %local.display(), motor = %settings.motor, "Loaded settings");
            return Ok(LoadedSettings::from_file(settings, local));
        }

        info!("No settings file found, using built-in defaults");
        Ok(LoadedSettings {
            settings: Self::default(),
            source: None,
        })
    }

    /// Load from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!(field = %w.field, "{}", w);
        }

        let settings: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Persist to `path`, replacing any previous contents.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Reject values that can never work (non-HTTP URLs, bad bind address).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = super::validation::validate_values(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Build an adapter with these settings applied.
    pub fn build_adapter(&self) -> BackendAdapter {
        let adapter = BackendAdapter::new(self.endpoints.clone());
        adapter.configure_remote(&self.remote.url, &self.remote.api_key, &self.remote.model);
        adapter.select_backend(self.motor);
        adapter
    }
}

/// Settings plus the file they came from.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    /// `None` when no file was found and defaults are in use
    pub source: Option<PathBuf>,
}

impl LoadedSettings {
    fn from_file(settings: Settings, path: &Path) -> Self {
        Self {
            settings,
            source: Some(path.to_path_buf()),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Settings parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Settings serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Settings validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// UI
// ============================================================================

/// Colour scheme of the browser front-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default)]
    pub theme: Theme,
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// HOST:PORT the API binds to
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
