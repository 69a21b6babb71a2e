//! Error types shared across Orangeface crates.

use std::path::PathBuf;

/// Top-level error type for Orangeface operations.
#[derive(Debug, thiserror::Error)]
pub enum OrangefaceError {
    #[error("Detector error: {message}")]
    Detector { message: String },

    #[error("Asset load error: {message}")]
    AssetLoad { message: String },

    #[error("Model error: {message}")]
    Model { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Video source error: {message}")]
    Source { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using OrangefaceError.
pub type OrangefaceResult<T> = Result<T, OrangefaceError>;

impl OrangefaceError {
    pub fn detector(msg: impl Into<String>) -> Self {
        Self::Detector {
            message: msg.into(),
        }
    }

    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad {
            message: msg.into(),
        }
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = OrangefaceError::detector("inference timed out");
        assert_eq!(err.to_string(), "Detector error: inference timed out");

        let err = OrangefaceError::FileNotFound {
            path: PathBuf::from("/tmp/orange.jpg"),
        };
        assert_eq!(err.to_string(), "File not found: /tmp/orange.jpg");
    }
}
