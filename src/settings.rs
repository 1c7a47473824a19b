// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use dirs_next::config_dir;
use log::{info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::sampler::SamplerSettings;

/// How images become textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    /// Image rows are stored top-down, OpenGL samples bottom-up.
    pub flip_vertically: bool,
    pub sampler: SamplerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: String::from("info"),
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using info", self.level);
            LevelFilter::Info
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub texture: TextureSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deserialization Error: {0}")]
    Serde(#[from] toml::de::Error),

    #[error("Serialization Error: {0}")]
    SerdeSer(#[from] toml::ser::Error),

    #[error("Configuration Directory Not Found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Retrieves the path to the user settings file.
    pub fn user_settings_path() -> Result<PathBuf, SettingsError> {
        let config_dir = config_dir().ok_or(SettingsError::ConfigDirNotFound)?;
        Ok(config_dir
            .join("texture2d")
            .join("settings")
            .join("user_settings.toml"))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Saves settings to a specified file path, ensuring the directory exists.
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Loads the user settings file. A missing file is created with the
    /// defaults; an unreadable one is left alone and the defaults are used.
    pub fn load_user_settings() -> Settings {
        match Settings::initialize_settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Error initializing settings: {}. Using defaults.", e);
                Settings::default()
            }
        }
    }

    fn initialize_settings() -> Result<Self, SettingsError> {
        let path = Settings::user_settings_path()?;
        if path.exists() {
            return Settings::load_from_file(&path);
        }

        info!("User settings not found. Writing defaults to {:?}", path);
        let settings = Settings::default();
        settings.save_to_file(&path)?;
        Ok(settings)
    }
}
