//! Renderer configuration
//!
//! Settings are stored as pretty-printed JSON. Every field has a default, so
//! a partial or missing file still yields a usable configuration.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::assets::DEFAULT_BACKGROUND;
use crate::color::Color;
use crate::geometry::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::match_state::PlayerSide;
use crate::render::BackendKind;

const CONFIG_DIR_NAME: &str = "blobby-gfx";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub backend: BackendKind,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
    pub show_shadow: bool,
    /// Directory holding `gfx/`, `backgrounds/` and language files
    pub data_dir: PathBuf,
    pub language: String,
    pub player_name: String,
    pub left_color: Color,
    pub right_color: Color,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            backend: BackendKind::Sdl,
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            fullscreen: false,
            vsync: true,
            show_shadow: true,
            data_dir: PathBuf::from("data"),
            language: "en".to_string(),
            player_name: "player".to_string(),
            left_color: Color::new(0, 0, 255),
            right_color: Color::new(255, 0, 0),
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

impl RenderConfig {
    pub fn blob_color(&self, side: PlayerSide) -> Color {
        match side {
            PlayerSide::Left => self.left_color,
            PlayerSide::Right => self.right_color,
        }
    }

    pub fn set_blob_color(&mut self, side: PlayerSide, color: Color) {
        match side {
            PlayerSide::Left => self.left_color = color,
            PlayerSide::Right => self.right_color = color,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads the configuration at `path`; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(RenderConfig::default());
        }
        let json = fs::read_to_string(path)?;
        let config = RenderConfig::from_json(&json)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Like [`RenderConfig::load`], but a broken file is logged and replaced by defaults
    pub fn load_or_default(path: &Path) -> Self {
        match RenderConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                RenderConfig::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        info!("Config saved to {}", path.display());
        Ok(())
    }
}

/// Location of the config file: the user's config directory, or the working directory
pub fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
