//! Detector variants and their parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two interchangeable face-detection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorVariant {
    /// Lightweight detector: fast, lower accuracy.
    Fast,
    /// Heavier detector: slower, higher accuracy.
    #[default]
    Accurate,
}

impl DetectorVariant {
    /// Human-readable model name shown in the debug panel.
    pub fn label(self) -> &'static str {
        match self {
            DetectorVariant::Fast => "TinyFaceDetector",
            DetectorVariant::Accurate => "SSD MobileNet",
        }
    }

    /// Compact encoding for lock-free shared flags.
    pub fn as_u8(self) -> u8 {
        match self {
            DetectorVariant::Fast => 0,
            DetectorVariant::Accurate => 1,
        }
    }

    /// Inverse of [`DetectorVariant::as_u8`]; unknown values map to `Accurate`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => DetectorVariant::Fast,
            _ => DetectorVariant::Accurate,
        }
    }
}

impl fmt::Display for DetectorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorVariant::Fast => write!(f, "fast"),
            DetectorVariant::Accurate => write!(f, "accurate"),
        }
    }
}

/// Error returned when parsing an unknown variant name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown detector variant '{0}' (expected 'fast' or 'accurate')")]
pub struct UnknownVariant(pub String);

impl FromStr for DetectorVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" | "tiny" => Ok(DetectorVariant::Fast),
            "accurate" | "ssd" => Ok(DetectorVariant::Accurate),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Parameters for the fast detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastParams {
    /// Minimum score for a box to be reported.
    pub score_threshold: f64,
    /// Square network input resolution tier (multiple of 32).
    pub input_size: u32,
}

impl Default for FastParams {
    fn default() -> Self {
        Self {
            score_threshold: 0.2,
            input_size: 320,
        }
    }
}

/// Parameters for the accurate detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccurateParams {
    /// Minimum confidence for a box to be reported.
    pub min_confidence: f64,
    /// Maximum number of faces returned. Only the first is ever used.
    pub max_results: u32,
}

impl Default for AccurateParams {
    fn default() -> Self {
        Self {
            min_confidence: 0.1,
            max_results: 1,
        }
    }
}

/// Fully specified detector options for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum DetectorConfig {
    Fast(FastParams),
    Accurate(AccurateParams),
}

impl DetectorConfig {
    pub fn variant(&self) -> DetectorVariant {
        match self {
            DetectorConfig::Fast(_) => DetectorVariant::Fast,
            DetectorConfig::Accurate(_) => DetectorVariant::Accurate,
        }
    }

    /// The detector's own reporting threshold.
    pub fn score_threshold(&self) -> f64 {
        match self {
            DetectorConfig::Fast(p) => p.score_threshold,
            DetectorConfig::Accurate(p) => p.min_confidence,
        }
    }

    /// Upper bound on returned detections, if the variant has one.
    pub fn max_results(&self) -> Option<usize> {
        match self {
            DetectorConfig::Fast(_) => None,
            DetectorConfig::Accurate(p) => Some(p.max_results.max(1) as usize),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig::Accurate(AccurateParams::default())
    }
}

/// Detector selection and per-variant parameters, as configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Variant used when the loop starts.
    pub default_variant: DetectorVariant,

    pub fast: FastParams,

    pub accurate: AccurateParams,
}

/// Error returned for out-of-range detector parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidDetectorSettings(pub String);

impl DetectorSettings {
    /// Resolve the full detector options for a variant.
    pub fn config_for(&self, variant: DetectorVariant) -> DetectorConfig {
        match variant {
            DetectorVariant::Fast => DetectorConfig::Fast(self.fast),
            DetectorVariant::Accurate => DetectorConfig::Accurate(self.accurate),
        }
    }

    pub fn validate(&self) -> Result<(), InvalidDetectorSettings> {
        let fast = &self.fast;
        let accurate = &self.accurate;

        if !(0.0..=1.0).contains(&fast.score_threshold) {
            return Err(InvalidDetectorSettings(format!(
                "detector.fast.score_threshold must be in [0, 1], got {}",
                fast.score_threshold
            )));
        }
        if fast.input_size == 0 || fast.input_size % 32 != 0 {
            return Err(InvalidDetectorSettings(format!(
                "detector.fast.input_size must be a positive multiple of 32, got {}",
                fast.input_size
            )));
        }
        if !(0.0..=1.0).contains(&accurate.min_confidence) {
            return Err(InvalidDetectorSettings(format!(
                "detector.accurate.min_confidence must be in [0, 1], got {}",
                accurate.min_confidence
            )));
        }
        if accurate.max_results == 0 {
            return Err(InvalidDetectorSettings(
                "detector.accurate.max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
