//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where job bundles are created by default.
    pub jobs_dir: PathBuf,

    /// Default encoding settings for the render backend.
    #[serde(default)]
    pub render: RenderDefaults,

    /// Asset generation worker pool and retry settings.
    #[serde(default)]
    pub generation: GenerationDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default encoding parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Output frame rate.
    pub fps: u32,

    /// ffmpeg video encoder.
    pub video_codec: String,

    /// ffmpeg audio encoder.
    pub audio_codec: String,

    /// Video bitrate in kbps.
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Sample rate used for generated silence and mixing.
    pub audio_sample_rate: u32,
}

/// Asset generation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    /// Maximum concurrent image-generation requests.
    pub max_concurrency: usize,

    /// Attempts per request, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff (milliseconds).
    pub base_delay_ms: u64,

    /// Upper bound on the backoff delay (milliseconds).
    pub max_delay_ms: u64,

    /// Wait used when the service reports it is loading but gives no estimate (milliseconds).
    pub default_wait_ms: u64,

    /// Shell command that renders one image. `$AUTOCUT_PROMPT` holds the
    /// prompt and `$AUTOCUT_OUTPUT` the file to write.
    pub command: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "autocut=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jobs_dir: dirs_default_jobs(),
            render: RenderDefaults::default(),
            generation: GenerationDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            fps: 24,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            video_bitrate_kbps: 8000,
            audio_bitrate_kbps: 192,
            audio_sample_rate: 48000,
        }
    }
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            max_attempts: 5,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            default_wait_ms: 20_000,
            command: None,
        }
    }
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

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("autocut").join("config.json")
}

/// Default job bundle directory.
fn dirs_default_jobs() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("autocut").join("jobs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_sections_with_defaults() {
        let raw = r#"{ "jobs_dir": "/srv/jobs", "render": { "fps": 30 } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.jobs_dir, PathBuf::from("/srv/jobs"));
        assert_eq!(config.render.fps, 30);
        assert_eq!(config.render.video_codec, "libx264");
        assert_eq!(config.generation.max_attempts, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_path_ends_with_app_dir() {
        let path = config_file_path();
        assert!(path.ends_with("autocut/config.json"));
    }
}
