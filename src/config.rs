use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::counter::{DEFAULT_CACHE_CAPACITY, DEFAULT_COUNTER_URL};
use crate::ui::components::action_row::Palette;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown colour {0:?}")]
    InvalidColor(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub foreground: String,
    pub background: String,
    pub boosted: String,
    pub reacted: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            foreground: "#e6e6e6".to_string(),
            background: "#000000".to_string(),
            boosted: "#34c759".to_string(),
            reacted: "#ff3b5c".to_string(),
        }
    }
}

impl PaletteConfig {
    pub fn resolve(&self) -> Result<Palette, ConfigError> {
        Ok(Palette {
            foreground: parse_color(&self.foreground)?,
            background: parse_color(&self.background)?,
            boosted: parse_color(&self.boosted)?,
            reacted: parse_color(&self.reacted)?,
        })
    }
}

fn parse_color(value: &str) -> Result<Color, ConfigError> {
    Color::from_str(value).map_err(|_| ConfigError::InvalidColor(value.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowConfig {
    pub counter_url: String,
    pub crossfade_ms: u64,
    pub badge_cache_capacity: usize,
    pub echo_delay_ms: u64,
    pub palette: PaletteConfig,
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            counter_url: DEFAULT_COUNTER_URL.to_string(),
            crossfade_ms: 150,
            badge_cache_capacity: DEFAULT_CACHE_CAPACITY,
            echo_delay_ms: 200,
            palette: PaletteConfig::default(),
        }
    }
}

impl RowConfig {
    /// Reads the config at `path`. A missing file means defaults; anything
    /// else that goes wrong is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        // Surface bad colours at load time rather than at first draw.
        config.palette.resolve()?;
        Ok(config)
    }

    pub fn crossfade(&self) -> Duration {
        Duration::from_millis(self.crossfade_ms)
    }

    pub fn echo_delay(&self) -> Duration {
        Duration::from_millis(self.echo_delay_ms)
    }
}
