//! Caption sidecars in SRT and VTT formats.
//!
//! Captions come from the render graph already resolved onto the output
//! timeline, so sidecar times line up with the rendered file (title cards
//! and crossfade overlap included).

use std::path::Path;
use std::str::FromStr;

use autocut_common::error::{AutocutError, AutocutResult};
use autocut_composer::TimedCaption;

/// Sidecar subtitle format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
        }
    }

    /// Pick a format from a file extension, defaulting to SRT.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("vtt") => SubtitleFormat::Vtt,
            _ => SubtitleFormat::Srt,
        }
    }
}

impl FromStr for SubtitleFormat {
    type Err = AutocutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "srt" => Ok(SubtitleFormat::Srt),
            "vtt" | "webvtt" => Ok(SubtitleFormat::Vtt),
            other => Err(AutocutError::unsupported(format!(
                "subtitle format `{other}` (expected srt or vtt)"
            ))),
        }
    }
}

/// Generate SRT subtitle content.
pub fn generate_srt(captions: &[TimedCaption]) -> String {
    let mut output = String::new();

    for (i, caption) in captions.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(caption.start),
            format_srt_time(caption.end),
        ));
        output.push_str(&caption.text);
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT subtitle content.
pub fn generate_vtt(captions: &[TimedCaption]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for caption in captions {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(caption.start),
            format_vtt_time(caption.end),
        ));
        output.push_str(&caption.text);
        output.push_str("\n\n");
    }

    output
}

pub fn generate(captions: &[TimedCaption], format: SubtitleFormat) -> String {
    match format {
        SubtitleFormat::Srt => generate_srt(captions),
        SubtitleFormat::Vtt => generate_vtt(captions),
    }
}

/// Split seconds into (hours, minutes, seconds, millis), rounding to the
/// nearest millisecond.
fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
pub fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
pub fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Save captions to a file; the format follows the extension.
pub fn save_subtitles(captions: &[TimedCaption], path: &Path) -> AutocutResult<()> {
    let content = generate(captions, SubtitleFormat::from_path(path));
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), captions = captions.len(), "Wrote subtitles");
    Ok(())
}
