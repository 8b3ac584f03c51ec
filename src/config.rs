//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/stagetree/stagetree.toml`
//! 3. Explicit config file passed by the caller
//! 4. Environment variables: `STAGETREE_*` prefix, `__` between sections

use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;

use crate::application::SessionOptions;
use crate::infrastructure::{InfraError, InfraResult};

/// Session behaviour settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionSettings {
    /// Remove structural parents left empty when a leaf loses its last value
    pub prune_empty_parents: bool,
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub user: Option<String>,
    pub log_level: Option<String>,
    pub session: RawSessionSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSessionSettings {
    pub prune_empty_parents: Option<bool>,
}

/// Unified configuration for stagetree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// User recorded on sessions (default: $USER or "admin")
    pub user: String,
    /// Log level: off, error, warn, info, debug or trace (default: warn)
    pub log_level: String,
    /// Session behaviour
    pub session: SessionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let user = std::env::var("USER").unwrap_or_else(|_| "admin".into());

        Self {
            user,
            log_level: "warn".into(),
            session: SessionSettings::default(),
        }
    }
}

/// Get the XDG config directory for stagetree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "stagetree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("stagetree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> InfraResult<RawSettings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
    parse_raw_settings(&content).map_err(|e| InfraError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn parse_raw_settings(content: &str) -> Result<RawSettings, toml::de::Error> {
    toml::from_str(content)
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            user: overlay.user.clone().unwrap_or_else(|| self.user.clone()),
            log_level: overlay
                .log_level
                .clone()
                .unwrap_or_else(|| self.log_level.clone()),
            session: SessionSettings {
                prune_empty_parents: overlay
                    .session
                    .prune_empty_parents
                    .unwrap_or(self.session.prune_empty_parents),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist when given
    pub fn load(config_file: Option<&Path>) -> InfraResult<Self> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = config_file {
            debug!(path = %path.display(), "loading config file");
            current = current.merge_with(&load_raw_settings(path)?);
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Settings from TOML text layered over the compiled defaults only.
    pub fn from_toml(content: &str) -> InfraResult<Self> {
        let raw = parse_raw_settings(content).map_err(|e| InfraError::Config {
            message: format!("parse config: {e}"),
        })?;
        let settings = Self::default().merge_with(&raw);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply STAGETREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> InfraResult<Self> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("STAGETREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("user") {
            settings.user = val;
        }
        if let Ok(val) = config.get_string("log_level") {
            settings.log_level = val;
        }
        match config.get_bool("session.prune_empty_parents") {
            Ok(val) => settings.session.prune_empty_parents = val,
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }

        Ok(settings)
    }

    fn validate(&self) -> InfraResult<()> {
        self.level_filter().map(|_| ())
    }

    /// Parsed `log_level`.
    pub fn level_filter(&self) -> InfraResult<LevelFilter> {
        LevelFilter::from_str(&self.log_level).map_err(|_| InfraError::Config {
            message: format!("invalid log_level '{}'", self.log_level),
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            prune_empty_parents: self.session.prune_empty_parents,
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> InfraResult<String> {
        toml::to_string_pretty(self).map_err(|e| InfraError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# stagetree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/stagetree/stagetree.toml
#   File:   passed explicitly by the embedding application
#   Env:    STAGETREE_* environment variables, e.g.
#           STAGETREE_LOG_LEVEL=debug
#           STAGETREE_SESSION__PRUNE_EMPTY_PARENTS=true

# User recorded on edit sessions
# user = "admin"

# One of: off, error, warn, info, debug, trace
# log_level = "warn"

[session]
# Remove parents left empty when a leaf loses its last value
# prune_empty_parents = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> InfraError {
    InfraError::Config {
        message: e.to_string(),
    }
}
