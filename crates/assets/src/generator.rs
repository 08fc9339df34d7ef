//! Image generator trait and the command-driven implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

/// Why a single generation attempt failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// The service answered with a non-success status. `retry_after` is the
    /// service's own estimate of when to try again (e.g. while a model loads).
    #[error("generation service returned status {code}")]
    Status {
        code: u16,
        retry_after: Option<Duration>,
    },

    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request cannot succeed by retrying.
    #[error("generation failed: {0}")]
    Fatal(String),
}

/// Turns a text prompt into an image file.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for `prompt`, naming the file after `file_stem`.
    async fn generate(&self, prompt: &str, file_stem: &str) -> Result<PathBuf, GenerationError>;

    /// Generator name, for logging.
    fn name(&self) -> &str;
}

/// Exit code a generation command uses to ask for a retry (`EX_TEMPFAIL`).
pub const EXIT_TEMPFAIL: i32 = 75;

/// Runs a shell command per image.
///
/// The command sees the prompt in `$AUTOCUT_PROMPT` and must write a PNG to
/// `$AUTOCUT_OUTPUT`. Exiting with [`EXIT_TEMPFAIL`] marks the attempt as
/// retryable (reported as status 503); any other failure is fatal.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: String,
    output_dir: PathBuf,
}

impl CommandGenerator {
    pub fn new(command: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ImageGenerator for CommandGenerator {
    async fn generate(&self, prompt: &str, file_stem: &str) -> Result<PathBuf, GenerationError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| GenerationError::Fatal(format!("cannot create output dir: {e}")))?;
        let output_path = self.output_dir.join(format!("{file_stem}.png"));

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env("AUTOCUT_PROMPT", prompt)
            .env("AUTOCUT_OUTPUT", &output_path)
            .output()
            .await
            .map_err(|e| GenerationError::Transport(format!("failed to run command: {e}")))?;

        if output.status.success() {
            if tokio::fs::metadata(&output_path).await.is_ok() {
                return Ok(output_path);
            }
            return Err(GenerationError::Fatal(format!(
                "command succeeded but wrote no file at {}",
                output_path.display()
            )));
        }

        if output.status.code() == Some(EXIT_TEMPFAIL) {
            return Err(GenerationError::Status {
                code: 503,
                retry_after: None,
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(GenerationError::Fatal(format!(
            "command exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }

    fn name(&self) -> &str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn test_command_writes_image() {
        let dir = scratch("autocut_test_command_generator_ok");
        let generator = CommandGenerator::new("printf '%s' \"$AUTOCUT_PROMPT\" > \"$AUTOCUT_OUTPUT\"", &dir);

        let path = generator.generate("a red circle", "graphic_0_1_a").await.unwrap();
        assert_eq!(path, dir.join("graphic_0_1_a.png"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a red circle");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_tempfail_exit_is_retryable_status() {
        let dir = scratch("autocut_test_command_generator_tempfail");
        let generator = CommandGenerator::new("exit 75", &dir);

        let err = generator.generate("x", "graphic_0").await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::Status {
                code: 503,
                retry_after: None
            }
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_output_is_fatal() {
        let dir = scratch("autocut_test_command_generator_nofile");
        let generator = CommandGenerator::new("true", &dir);

        let err = generator.generate("x", "graphic_0").await.unwrap_err();
        assert!(matches!(err, GenerationError::Fatal(_)));

        let failing = CommandGenerator::new("echo boom >&2; exit 2", &dir);
        let err = failing.generate("x", "graphic_0").await.unwrap_err();
        assert!(matches!(err, GenerationError::Fatal(msg) if msg.contains("boom")));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
