//! Audio mix planning.
//!
//! | original audio | music | directive |
//! |---|---|---|
//! | no  | no  | `Silence` |
//! | yes | no  | `PassThrough` |
//! | no  | yes | `MusicOnly` |
//! | yes | yes | `Mixed` |
//!
//! The planner branches explicitly on presence; it never builds a mix node
//! over a missing track.

use std::path::PathBuf;

use autocut_plan_model::{AudioTrack, MusicSource, Recovery};
use serde::{Deserialize, Serialize};

/// Gain used when the configured music volume is unusable.
pub const DEFAULT_MUSIC_GAIN: f64 = 0.1;

/// How music is fitted to the final duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MusicFit {
    /// Music is shorter than the output: repeat it, then cut at the target.
    Loop { repeats: u32 },
    /// Music is at least as long as the output: cut it at the target.
    Trim,
}

/// A music track prepared for the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicPlan {
    pub path: PathBuf,
    /// Length of one pass of the music file.
    pub source_duration: f64,
    /// Length the music must cover (the final output duration).
    pub target_duration: f64,
    pub fit: MusicFit,
    /// Linear gain, applied to the music only.
    pub gain: f64,
    pub fade_in: f64,
    pub fade_out: f64,
}

/// The single audio instruction for the whole render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AudioDirective {
    Silence,
    /// Segment audio as cut, untouched.
    PassThrough,
    MusicOnly(MusicPlan),
    /// Segment audio at full level plus the music plan.
    Mixed(MusicPlan),
}

impl AudioDirective {
    pub fn music(&self) -> Option<&MusicPlan> {
        match self {
            AudioDirective::MusicOnly(plan) | AudioDirective::Mixed(plan) => Some(plan),
            AudioDirective::Silence | AudioDirective::PassThrough => None,
        }
    }

    pub fn uses_original(&self) -> bool {
        matches!(self, AudioDirective::PassThrough | AudioDirective::Mixed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AudioDirective::Silence => "silence",
            AudioDirective::PassThrough => "pass-through",
            AudioDirective::MusicOnly(_) => "music only",
            AudioDirective::Mixed(_) => "mixed",
        }
    }
}

/// Music gain and fade settings.
#[derive(Debug, Clone, Copy)]
pub struct MusicSettings {
    pub volume: f64,
    pub fade_secs: f64,
}

/// Decide the audio directive.
pub fn plan_audio(
    has_original: bool,
    music: Option<&MusicSource>,
    final_duration: f64,
    settings: MusicSettings,
    recoveries: &mut Vec<Recovery>,
) -> AudioDirective {
    if !has_original {
        recoveries.push(Recovery::AudioSourceAbsent {
            track: AudioTrack::Original,
        });
    }

    let music = match music {
        Some(m) if m.is_usable() => Some(m),
        Some(m) => {
            tracing::warn!(
                path = %m.path.display(),
                duration = m.duration,
                "Music has no usable duration; planning without it"
            );
            recoveries.push(Recovery::AudioSourceAbsent {
                track: AudioTrack::Music,
            });
            None
        }
        None => None,
    };

    let directive = match (has_original, music) {
        (false, None) => AudioDirective::Silence,
        (true, None) => AudioDirective::PassThrough,
        (false, Some(m)) => AudioDirective::MusicOnly(fit_music(m, final_duration, settings)),
        (true, Some(m)) => AudioDirective::Mixed(fit_music(m, final_duration, settings)),
    };

    tracing::debug!(directive = directive.label(), final_duration, "Planned audio");
    directive
}

fn fit_music(music: &MusicSource, final_duration: f64, settings: MusicSettings) -> MusicPlan {
    let fit = if music.duration < final_duration {
        let repeats = (final_duration / music.duration).ceil();
        MusicFit::Loop {
            repeats: repeats.min(u32::MAX as f64) as u32,
        }
    } else {
        MusicFit::Trim
    };

    let gain = if settings.volume.is_finite() && settings.volume >= 0.0 {
        settings.volume
    } else {
        tracing::warn!(volume = settings.volume, "Invalid music volume; using default");
        DEFAULT_MUSIC_GAIN
    };

    let fade = if settings.fade_secs.is_finite() && settings.fade_secs > 0.0 {
        settings.fade_secs.min(final_duration / 2.0)
    } else {
        0.0
    };

    MusicPlan {
        path: music.path.clone(),
        source_duration: music.duration,
        target_duration: final_duration,
        fit,
        gain,
        fade_in: fade,
        fade_out: fade,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: MusicSettings = MusicSettings {
        volume: 0.1,
        fade_secs: 2.0,
    };

    #[test]
    fn test_decision_table() {
        let music = MusicSource::new("bg.mp3", 60.0);
        let mut r = Vec::new();
        assert_eq!(plan_audio(false, None, 20.0, SETTINGS, &mut r), AudioDirective::Silence);
        assert_eq!(plan_audio(true, None, 20.0, SETTINGS, &mut r), AudioDirective::PassThrough);
        assert!(matches!(
            plan_audio(false, Some(&music), 20.0, SETTINGS, &mut r),
            AudioDirective::MusicOnly(_)
        ));
        assert!(matches!(
            plan_audio(true, Some(&music), 20.0, SETTINGS, &mut r),
            AudioDirective::Mixed(_)
        ));
    }

    #[test]
    fn test_short_music_loops() {
        let music = MusicSource::new("bg.mp3", 5.0);
        let mut r = Vec::new();
        let directive = plan_audio(false, Some(&music), 20.0, SETTINGS, &mut r);
        let plan = directive.music().unwrap();
        assert_eq!(plan.fit, MusicFit::Loop { repeats: 4 });
        assert_eq!(plan.target_duration, 20.0);
        assert!((plan.gain - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_long_music_trims() {
        let music = MusicSource::new("bg.mp3", 20.0);
        let mut r = Vec::new();
        let directive = plan_audio(true, Some(&music), 20.0, SETTINGS, &mut r);
        assert_eq!(directive.music().unwrap().fit, MusicFit::Trim);
        assert!(r.is_empty());
    }

    #[test]
    fn test_fade_capped_to_half_duration() {
        let music = MusicSource::new("bg.mp3", 60.0);
        let mut r = Vec::new();
        let directive = plan_audio(true, Some(&music), 3.0, SETTINGS, &mut r);
        let plan = directive.music().unwrap();
        assert!((plan.fade_in - 1.5).abs() < 1e-9);
        assert!((plan.fade_out - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_unusable_music_treated_as_absent() {
        let music = MusicSource::new("bg.mp3", 0.0);
        let mut r = Vec::new();
        let directive = plan_audio(true, Some(&music), 10.0, SETTINGS, &mut r);
        assert_eq!(directive, AudioDirective::PassThrough);
        assert_eq!(
            r,
            vec![Recovery::AudioSourceAbsent {
                track: AudioTrack::Music
            }]
        );
    }

    #[test]
    fn test_negative_volume_uses_default() {
        let music = MusicSource::new("bg.mp3", 60.0);
        let mut r = Vec::new();
        let settings = MusicSettings {
            volume: -1.0,
            fade_secs: 0.0,
        };
        let directive = plan_audio(true, Some(&music), 10.0, settings, &mut r);
        let plan = directive.music().unwrap();
        assert_eq!(plan.gain, DEFAULT_MUSIC_GAIN);
        assert_eq!(plan.fade_in, 0.0);
    }
}
