//! Configuration sections shared across crates.
//!
//! The full application config, which also carries detector settings, is
//! assembled by the runtime crate from these sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{OrangefaceError, OrangefaceResult};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "orangeface=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Contour shaping parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourSettings {
    /// Radial padding applied to eye contours about their centroid.
    pub eye_padding: f64,
}

/// Compositor options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorSettings {
    /// Overlay image drawn over the detected face.
    pub overlay_path: PathBuf,

    /// Overlay side length as a multiple of the face box width.
    pub overlay_scale: f64,

    /// TrueType font for debug text. The bundled font is used without one.
    pub font_path: Option<PathBuf>,

    /// Start in debug (passthrough) mode.
    pub debug: bool,
}

/// Loop pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    /// Target cycles per second when driven by the interval scheduler.
    pub target_fps: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl Default for ContourSettings {
    fn default() -> Self {
        Self { eye_padding: 1.8 }
    }
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            overlay_path: PathBuf::from("orange.jpg"),
            overlay_scale: 1.5,
            font_path: None,
            debug: false,
        }
    }
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self { target_fps: 30 }
    }
}

impl ContourSettings {
    pub fn validate(&self) -> OrangefaceResult<()> {
        if !self.eye_padding.is_finite() || self.eye_padding < 1.0 {
            return Err(OrangefaceError::config(format!(
                "contour.eye_padding must be >= 1.0, got {}",
                self.eye_padding
            )));
        }
        Ok(())
    }
}

impl CompositorSettings {
    pub fn validate(&self) -> OrangefaceResult<()> {
        if !self.overlay_scale.is_finite() || self.overlay_scale <= 0.0 {
            return Err(OrangefaceError::config(format!(
                "compositor.overlay_scale must be positive, got {}",
                self.overlay_scale
            )));
        }
        Ok(())
    }
}

impl PacingSettings {
    pub fn validate(&self) -> OrangefaceResult<()> {
        if self.target_fps == 0 {
            return Err(OrangefaceError::config("pacing.target_fps must be at least 1"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("orangeface").join("config.json")
}
