//! Simulator settings
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `BATTLESIM_`-prefixed environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::{BattleConfig, DEFAULT_TURN_DELAY};
use crate::roster::{Roster, RosterError};

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "battlesim.toml";

/// Prefix for environment overrides, e.g. `BATTLESIM_TURN_DELAY_MS=0`
pub const ENV_PREFIX: &str = "BATTLESIM_";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("config file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid roster: {0}")]
    Roster(#[from] RosterError),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Figment(Box::new(e))
    }
}

/// Simulator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pause between rounds in milliseconds
    pub turn_delay_ms: u64,
    /// Fixed RNG seed for reproducible battles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Combatants for the battle
    pub roster: Roster,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            turn_delay_ms: DEFAULT_TURN_DELAY.as_millis() as u64,
            seed: None,
            roster: Roster::demo(),
        }
    }
}

impl Settings {
    /// Figment with every provider layered in precedence order
    ///
    /// Without a `path` the default file is used if it exists.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load settings from all sources
    ///
    /// An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
        }
        Ok(Self::figment(path).extract()?)
    }

    /// Load settings from a TOML string over the defaults (no env)
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::string(toml))
            .extract()?)
    }

    pub fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }

    pub fn battle_config(&self) -> BattleConfig {
        BattleConfig::with_delay(self.turn_delay())
    }
}
