//! Render jobs, backends and progress reporting.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use autocut_common::config::RenderDefaults;
use autocut_common::error::{AutocutError, AutocutResult};
use autocut_composer::RenderGraph;

use crate::filter_graph::{build_invocation, FfmpegInvocation};
use crate::subtitles::{save_subtitles, SubtitleFormat};

/// Encoder settings for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
    /// Sample rate for cut, generated and mixed audio.
    pub sample_rate: u32,
}

impl From<&RenderDefaults> for EncodeSettings {
    fn from(defaults: &RenderDefaults) -> Self {
        Self {
            fps: defaults.fps.max(1),
            video_codec: defaults.video_codec.clone(),
            audio_codec: defaults.audio_codec.clone(),
            video_bitrate_kbps: defaults.video_bitrate_kbps,
            audio_bitrate_kbps: defaults.audio_bitrate_kbps,
            sample_rate: defaults.audio_sample_rate,
        }
    }
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self::from(&RenderDefaults::default())
    }
}

/// A render job ready to be executed.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// The composed graph to render.
    pub graph: RenderGraph,

    /// Output file path.
    pub output_path: PathBuf,

    /// Encoder settings.
    pub settings: EncodeSettings,

    /// Write a caption sidecar next to the output.
    pub subtitles: Option<SubtitleFormat>,
}

impl RenderJob {
    pub fn new(graph: RenderGraph, output_path: impl Into<PathBuf>) -> Self {
        Self {
            graph,
            output_path: output_path.into(),
            settings: EncodeSettings::default(),
            subtitles: None,
        }
    }

    /// Sidecar path for the given subtitle format.
    pub fn subtitle_path(&self, format: SubtitleFormat) -> PathBuf {
        self.output_path.with_extension(format.extension())
    }
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send>;

/// Render progress report.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: RenderStage,
}

impl RenderProgress {
    fn at_stage(stage: RenderStage, progress: f64, total_frames: u64) -> Self {
        Self {
            progress,
            frames_rendered: (progress * total_frames as f64).round() as u64,
            total_frames,
            eta_secs: 0.0,
            stage,
        }
    }
}

/// Stages of the render process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// A backend that turns a render graph into a media file.
pub trait RenderBackend: Send {
    /// Execute the render job.
    fn render(&mut self, job: &RenderJob, progress: Option<ProgressCallback>) -> AutocutResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Render a graph with the ffmpeg backend.
///
/// This is the main entry point for rendering.
pub async fn render_graph(
    job: RenderJob,
    progress: Option<ProgressCallback>,
) -> AutocutResult<PathBuf> {
    let backend: Box<dyn RenderBackend> = Box::new(FfmpegBackend::new());
    if !backend.is_available() {
        return Err(AutocutError::unsupported(
            "No supported render backend found (expected ffmpeg in PATH)",
        ));
    }
    render_with_backend(backend, job, progress).await
}

/// Render a graph with the given backend.
///
/// The backend runs on the blocking pool. On failure any partially written
/// output is removed before the error is returned; render failures are
/// never retried.
pub async fn render_with_backend(
    mut backend: Box<dyn RenderBackend>,
    job: RenderJob,
    progress: Option<ProgressCallback>,
) -> AutocutResult<PathBuf> {
    tracing::info!(
        output = %job.output_path.display(),
        units = job.graph.units.len(),
        duration = job.graph.duration,
        backend = backend.name(),
        "Starting render"
    );

    if !job.graph.source.exists() {
        return Err(AutocutError::FileNotFound {
            path: job.graph.source.clone(),
        });
    }

    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let output_path = job.output_path.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let result = backend.render(&job, progress);
        (job, result)
    })
    .await;

    let job = match outcome {
        Ok((job, Ok(()))) => job,
        Ok((_, Err(err))) => {
            remove_partial_output(&output_path);
            tracing::error!(error = %err, "Render failed");
            return Err(err);
        }
        Err(join_err) => {
            remove_partial_output(&output_path);
            tracing::error!(error = %join_err, "Render task panicked");
            return Err(AutocutError::render(format!(
                "Render task panicked: {join_err}"
            )));
        }
    };

    if let Some(format) = job.subtitles {
        let captions = job.graph.timed_captions();
        save_subtitles(&captions, &job.subtitle_path(format))?;
    }

    tracing::info!(output = %job.output_path.display(), "Render complete");
    Ok(job.output_path)
}

fn remove_partial_output(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::warn!(path = %path.display(), "Removed partial output"),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Failed to remove partial output")
        }
    }
}

/// Renders by spawning `ffmpeg` with a generated filter graph.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: PathBuf,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
        }
    }

    /// Use a specific ffmpeg binary.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run_ffmpeg(
        &self,
        invocation: &FfmpegInvocation,
        progress: Option<ProgressCallback>,
    ) -> AutocutResult<()> {
        tracing::debug!(args = ?invocation.args, "Running ffmpeg");
        let mut cmd = Command::new(&self.binary);
        cmd.args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| AutocutError::render(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            args_len = invocation.args.len(),
            total_frames = invocation.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AutocutError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AutocutError::render("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once the stderr pipe fills up.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        let mut latest = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = std::time::Instant::now();
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| AutocutError::render(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            latest.update(key, value);
            if key != "progress" {
                continue;
            }

            if latest.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = latest.out_time_secs;
                last_progress_wall = std::time::Instant::now();
            }
            if let Some(cb) = &progress {
                cb(progress_report(
                    &latest,
                    invocation.total_frames,
                    invocation.expected_duration,
                    start.elapsed().as_secs_f64(),
                ));
            }
            if last_progress_wall.elapsed().as_secs() >= 10 {
                tracing::warn!(
                    out_time_secs = latest.out_time_secs,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for 10s"
                );
                last_progress_wall = std::time::Instant::now();
            }
        }

        let status = child
            .wait()
            .map_err(|e| AutocutError::render(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            if let Some(cb) = &progress {
                cb(RenderProgress::at_stage(
                    RenderStage::Failed,
                    latest.fraction(invocation.expected_duration),
                    invocation.total_frames,
                ));
            }
            return Err(AutocutError::render(format!(
                "ffmpeg render failed (status {}): {}",
                status,
                stderr_tail(&stderr_output, 20)
            )));
        }

        if let Some(cb) = &progress {
            cb(RenderProgress::at_stage(
                RenderStage::Complete,
                1.0,
                invocation.total_frames,
            ));
        }

        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(&mut self, job: &RenderJob, progress: Option<ProgressCallback>) -> AutocutResult<()> {
        let started = std::time::Instant::now();
        let invocation = build_invocation(&job.graph, &job.output_path, &job.settings);
        tracing::info!(
            inputs = invocation.args.iter().filter(|a| *a == "-i").count(),
            filter_len = invocation.filter_complex.len(),
            total_frames = invocation.total_frames,
            "Built ffmpeg filter graph"
        );

        if let Some(cb) = &progress {
            cb(RenderProgress::at_stage(
                RenderStage::Preparing,
                0.0,
                invocation.total_frames,
            ));
        }

        self.run_ffmpeg(&invocation, progress)?;
        tracing::info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            "ffmpeg render finished"
        );
        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary.display().to_string())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Encoder arguments for the configured codecs.
pub fn codec_args(settings: &EncodeSettings) -> Vec<String> {
    let video_bitrate = format!("{}k", settings.video_bitrate_kbps.max(500));
    let audio_bitrate = format!("{}k", settings.audio_bitrate_kbps.max(64));

    let mut args = vec!["-c:v".to_string(), settings.video_codec.clone()];
    if settings.video_codec == "libx264" || settings.video_codec == "libx265" {
        args.extend(["-preset".to_string(), "medium".to_string()]);
    }
    args.extend([
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-b:v".to_string(),
        video_bitrate,
        "-c:a".to_string(),
        settings.audio_codec.clone(),
        "-b:a".to_string(),
        audio_bitrate,
        "-ar".to_string(),
        settings.sample_rate.to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]);
    args
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn stderr_tail(output: &str, lines: usize) -> String {
    let collected: Vec<&str> = output.trim().lines().collect();
    let skip = collected.len().saturating_sub(lines);
    collected[skip..].join("\n")
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // Despite the name, ffmpeg reports out_time_ms in microseconds.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }

    fn fraction(&self, expected_duration_secs: f64) -> f64 {
        if expected_duration_secs <= 0.0 {
            0.0
        } else {
            (self.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> RenderProgress {
    let progress = state.fraction(expected_duration_secs);

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    RenderProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            RenderStage::Finalizing
        } else {
            RenderStage::Rendering
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_state_parses_microseconds() {
        let mut state = ProgressState::default();
        state.update("out_time_ms", "5000000");
        assert!((state.out_time_secs - 5.0).abs() < 1e-9);
        state.update("out_time_us", "7500000");
        assert!((state.out_time_secs - 7.5).abs() < 1e-9);
        state.update("progress", "continue");
        assert!(!state.complete);
        state.update("progress", "end");
        assert!(state.complete);
    }

    #[test]
    fn test_progress_report_eta_and_frames() {
        let state = ProgressState {
            out_time_secs: 5.0,
            complete: false,
        };
        let report = progress_report(&state, 240, 10.0, 4.0);
        assert!((report.progress - 0.5).abs() < 1e-9);
        assert_eq!(report.frames_rendered, 120);
        assert!((report.eta_secs - 4.0).abs() < 1e-9);
        assert_eq!(report.stage, RenderStage::Rendering);
    }

    #[test]
    fn test_progress_report_complete() {
        let state = ProgressState {
            out_time_secs: 9.9,
            complete: true,
        };
        let report = progress_report(&state, 240, 10.0, 4.0);
        assert_eq!(report.progress, 1.0);
        assert_eq!(report.stage, RenderStage::Finalizing);
    }

    #[test]
    fn test_codec_args_use_settings() {
        let settings = EncodeSettings {
            video_codec: "libvpx-vp9".to_string(),
            audio_codec: "libopus".to_string(),
            video_bitrate_kbps: 100,
            ..EncodeSettings::default()
        };
        let args = codec_args(&settings);
        assert!(args.windows(2).any(|w| w == ["-c:v", "libvpx-vp9"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "libopus"]));
        assert!(args.windows(2).any(|w| w == ["-b:v", "500k"]));
        assert!(!args.contains(&"-preset".to_string()));
    }

    #[test]
    fn test_stderr_tail() {
        let output = "a\nb\nc\nd\n";
        assert_eq!(stderr_tail(output, 2), "c\nd");
        assert_eq!(stderr_tail(output, 10), "a\nb\nc\nd");
    }
}
