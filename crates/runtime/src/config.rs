//! Application configuration.

use std::path::{Path, PathBuf};

use orangeface_common::config::{
    config_file_path, CompositorSettings, ContourSettings, LoggingConfig, PacingSettings,
};
use orangeface_common::error::{OrangefaceError, OrangefaceResult};
use orangeface_face_model::DetectorSettings;
use serde::{Deserialize, Serialize};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Detector selection and parameters.
    pub detector: DetectorSettings,

    /// Landmark contour shaping.
    pub contour: ContourSettings,

    /// Per-frame rendering options.
    pub compositor: CompositorSettings,

    /// Detection loop pacing.
    pub pacing: PacingSettings,
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> OrangefaceResult<Self> {
        if !path.exists() {
            return Err(OrangefaceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&config_path, json)?;
        Ok(config_path)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> OrangefaceResult<()> {
        self.detector
            .validate()
            .map_err(|e| OrangefaceError::config(e.to_string()))?;
        self.contour.validate()?;
        self.compositor.validate()?;
        self.pacing.validate()
    }
}
