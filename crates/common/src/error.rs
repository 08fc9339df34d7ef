//! Error types shared across autocut crates.
//!
//! Composition itself never fails: malformed plans, missing assets and
//! infeasible transitions are recovered locally by the composer. These
//! variants cover the I/O edges around it (job bundles, probing, asset
//! generation, and the rendering backend).

use std::path::PathBuf;

/// Top-level error type for autocut operations.
#[derive(Debug, thiserror::Error)]
pub enum AutocutError {
    #[error("Plan error: {message}")]
    Plan { message: String },

    #[error("Asset error: {message}")]
    Asset { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Generation error: {message}")]
    Generation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using AutocutError.
pub type AutocutResult<T> = Result<T, AutocutError>;

impl AutocutError {
    pub fn plan(msg: impl Into<String>) -> Self {
        Self::Plan {
            message: msg.into(),
        }
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            AutocutError::render("ffmpeg exited").to_string(),
            "Render error: ffmpeg exited"
        );
        assert_eq!(
            AutocutError::probe("no streams").to_string(),
            "Probe error: no streams"
        );
        assert!(AutocutError::FileNotFound {
            path: PathBuf::from("/tmp/missing.mp4")
        }
        .to_string()
        .contains("/tmp/missing.mp4"));
    }

    #[test]
    fn test_io_error_converts() {
        fn fails() -> AutocutResult<()> {
            Err(std::io::Error::other("disk full"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, AutocutError::Io(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
