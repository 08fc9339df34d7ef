//! Media probing via `ffprobe`.

use std::path::Path;
use std::process::Command;

use autocut_common::error::{AutocutError, AutocutResult};
use autocut_plan_model::{MusicSource, SourceInfo};
use serde::Deserialize;

/// What ffprobe reports about a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbe {
    /// Container duration in seconds (0.0 when unknown).
    pub duration: f64,
    /// Frame size of the first video stream.
    pub frame_size: Option<(u32, u32)>,
    pub has_audio: bool,
}

impl MediaProbe {
    /// Describe the probed file as the main source video.
    pub fn into_source_info(self, path: &Path) -> AutocutResult<SourceInfo> {
        let (width, height) = self.frame_size.ok_or_else(|| {
            AutocutError::probe(format!("{} has no video stream", path.display()))
        })?;
        SourceInfo::new(path, self.duration, width, height, self.has_audio)
            .map_err(|e| AutocutError::probe(format!("{}: {e}", path.display())))
    }

    /// Describe the probed file as background music.
    ///
    /// Unusable durations are kept; the composer records them as an absent
    /// music track.
    pub fn into_music_source(self, path: &Path) -> MusicSource {
        if !self.has_audio {
            tracing::warn!(path = %path.display(), "Music file has no audio stream");
            return MusicSource::new(path, 0.0);
        }
        MusicSource::new(path, self.duration)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    duration: Option<String>,
}

impl ProbeStream {
    fn is(&self, kind: &str) -> bool {
        self.codec_type.as_deref() == Some(kind)
    }
}

/// Parse `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_json(json: &str) -> AutocutResult<MediaProbe> {
    let output: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| AutocutError::probe(format!("Invalid ffprobe JSON: {e}")))?;

    let video = output.streams.iter().find(|s| s.is("video"));
    let has_audio = output.streams.iter().any(|s| s.is("audio"));

    // Some containers only report duration on the streams.
    let duration = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or_else(|| output.streams.iter().find_map(|s| s.duration.as_deref()))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .unwrap_or(0.0);

    let frame_size = video.and_then(|v| match (v.width, v.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
        _ => None,
    });

    Ok(MediaProbe {
        duration,
        frame_size,
        has_audio,
    })
}

/// Run ffprobe on `path`.
pub fn probe_media(path: &Path) -> AutocutResult<MediaProbe> {
    if !path.exists() {
        return Err(AutocutError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| AutocutError::probe(format!("Failed to start ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(AutocutError::probe(format!(
            "ffprobe failed on {} (status {})",
            path.display(),
            output.status
        )));
    }

    let probe = parse_probe_json(&String::from_utf8_lossy(&output.stdout))?;
    tracing::debug!(
        path = %path.display(),
        duration = probe.duration,
        frame_size = ?probe.frame_size,
        has_audio = probe.has_audio,
        "Probed media"
    );
    Ok(probe)
}

/// Probe the main source video.
pub fn probe_source(path: &Path) -> AutocutResult<SourceInfo> {
    probe_media(path)?.into_source_info(path)
}

/// Probe a background music file.
pub fn probe_music(path: &Path) -> AutocutResult<MusicSource> {
    Ok(probe_media(path)?.into_music_source(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TALK: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30/1"},
            {"index": 1, "codec_type": "audio", "sample_rate": "48000"}
        ],
        "format": {"filename": "talk.mp4", "duration": "62.500000"}
    }"#;

    #[test]
    fn test_parse_video_with_audio() {
        let probe = parse_probe_json(TALK).unwrap();
        assert!((probe.duration - 62.5).abs() < 1e-9);
        assert_eq!(probe.frame_size, Some((1920, 1080)));
        assert!(probe.has_audio);

        let info = probe.into_source_info(Path::new("/media/talk.mp4")).unwrap();
        assert_eq!(info.width(), 1920);
        assert!(info.has_audio());
    }

    #[test]
    fn test_parse_audio_only_music() {
        let json = r#"{
            "streams": [{"codec_type": "audio", "duration": "95.2"}],
            "format": {}
        }"#;
        let probe = parse_probe_json(json).unwrap();
        assert!((probe.duration - 95.2).abs() < 1e-9);
        assert_eq!(probe.frame_size, None);

        let music = probe.clone().into_music_source(Path::new("/media/bed.mp3"));
        assert!(music.is_usable());
        assert!(probe.into_source_info(Path::new("/media/bed.mp3")).is_err());
    }

    #[test]
    fn test_parse_silent_video() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 640, "height": 360}],
            "format": {"duration": "10.0"}
        }"#;
        let probe = parse_probe_json(json).unwrap();
        assert!(!probe.has_audio);
        let music = probe.into_music_source(Path::new("/media/clip.mp4"));
        assert!(!music.is_usable());
    }

    #[test]
    fn test_zero_duration_rejected_as_source() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360}]}"#;
        let probe = parse_probe_json(json).unwrap();
        assert_eq!(probe.duration, 0.0);
        assert!(probe.into_source_info(Path::new("/media/broken.mp4")).is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(parse_probe_json("not json").is_err());
    }
}
