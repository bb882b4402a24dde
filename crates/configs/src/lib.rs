//! # configs
//!
//! Layered settings for word-draw using the `config` crate.
//!
//! Sources (highest priority wins):
//! 1. Environment variables (`WORD_DRAW__` prefix, `__` between sections),
//!    e.g. `WORD_DRAW__DRAW__DRAW_TIME="2 days"`
//! 2. A TOML file (`word-draw.toml` by default, optional)
//! 3. Built-in defaults
//!
//! A `.env` file in the working directory is loaded first via `dotenvy`.

mod duration;
mod error;

use std::path::Path;

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};
use domains::models::DrawWindow;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::debug;

pub use duration::parse_duration;
pub use error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "word-draw.toml";
pub const ENV_PREFIX: &str = "WORD_DRAW";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub draw: DrawSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// e.g. `sqlite://word-draw.db`; may embed credentials, so kept secret.
    #[serde(deserialize_with = "deserialize_secret")]
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawSettings {
    /// How long a user has to upload work for a draw.
    pub draw_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    /// Loads `.env`, then the given (or default) TOML file, then the environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }

        let file = config_file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        debug!(file = %file.display(), "loading settings");

        let config = Self::defaults()?
            .add_source(File::from(file).required(config_file.is_some()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_config(config)
    }

    /// Defaults overlaid with a TOML document; no environment lookup.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("database.url", "sqlite://word-draw.db")?
            .set_default("database.max_connections", 5_i64)?
            .set_default("draw.draw_time", "1 00:00:00")?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        Ok(config.try_deserialize()?)
    }

    /// The configured draw window, validated to be positive.
    pub fn draw_window(&self) -> Result<DrawWindow, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidDuration {
            value: self.draw.draw_time.clone(),
            reason,
        };
        let duration = parse_duration(&self.draw.draw_time).map_err(invalid)?;
        DrawWindow::new(duration).map_err(|e| invalid(e.to_string()))
    }
}
