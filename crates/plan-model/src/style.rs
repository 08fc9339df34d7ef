//! Per-invocation style and feature options.
//!
//! A `StyleConfig` is an immutable value built fresh for each composition;
//! nothing here is shared between calls.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Global post-process applied once to the assembled video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualFilter {
    #[default]
    None,
    Monochrome,
    InvertColors,
    Mirror,
    Rotate90,
    Rotate180,
}

impl VisualFilter {
    pub const ALL: [VisualFilter; 6] = [
        VisualFilter::None,
        VisualFilter::Monochrome,
        VisualFilter::InvertColors,
        VisualFilter::Mirror,
        VisualFilter::Rotate90,
        VisualFilter::Rotate180,
    ];

    /// Canonical name, as accepted by `FromStr`.
    pub fn name(&self) -> &'static str {
        match self {
            VisualFilter::None => "none",
            VisualFilter::Monochrome => "monochrome",
            VisualFilter::InvertColors => "invert_colors",
            VisualFilter::Mirror => "mirror",
            VisualFilter::Rotate90 => "rotate90",
            VisualFilter::Rotate180 => "rotate180",
        }
    }
}

impl fmt::Display for VisualFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A filter name that matches no known filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visual filter `{0}` (expected one of: none, monochrome, invert_colors, mirror, rotate90, rotate180)")]
pub struct UnknownFilter(pub String);

impl FromStr for VisualFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(|c: char| c == '-' || c == ' ', "_");
        match normalized.as_str() {
            "" | "none" => Ok(VisualFilter::None),
            "monochrome" | "bw" | "blackwhite" | "black_white" | "grayscale" | "greyscale" => {
                Ok(VisualFilter::Monochrome)
            }
            "invert" | "invert_colors" | "invertcolors" | "negate" => {
                Ok(VisualFilter::InvertColors)
            }
            "mirror" | "mirror_x" | "hflip" => Ok(VisualFilter::Mirror),
            "rotate90" | "rotate_90" => Ok(VisualFilter::Rotate90),
            "rotate180" | "rotate_180" => Ok(VisualFilter::Rotate180),
            _ => Err(UnknownFilter(s.to_string())),
        }
    }
}

/// Subtitle text styling, used for burned-in captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    /// Font family name handed to the text renderer.
    pub font: String,
    pub font_size: u32,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    /// Optional background box behind the text.
    pub box_color: Option<String>,
    /// Box opacity in `[0.0, 1.0]`; ignored without `box_color`.
    pub box_opacity: Option<f64>,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font: "DejaVu Sans".to_string(),
            font_size: 40,
            color: "white".to_string(),
            stroke_color: "black".to_string(),
            stroke_width: 2,
            box_color: None,
            box_opacity: None,
        }
    }
}

/// Feature options for one composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Background music file. The caller probes it into a `MusicSource`.
    pub music: Option<PathBuf>,

    /// Linear gain applied to the music track only.
    pub music_volume: f64,

    /// Music fade-in/fade-out length in seconds (0 disables).
    pub music_fade_secs: f64,

    /// Requested crossfade between adjacent segments (0 disables).
    pub crossfade_secs: f64,

    /// Unknown names in JSON are ignored with a warning.
    #[serde(deserialize_with = "lenient_filter")]
    pub visual_filter: VisualFilter,

    pub intro_text: Option<String>,
    pub outro_text: Option<String>,

    /// Length of each title card in seconds.
    pub title_card_secs: f64,
    pub title_background: String,
    pub title_color: String,

    pub subtitle: SubtitleStyle,

    /// Graphics are centered and scaled to this fraction of frame height.
    pub graphic_height_ratio: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            music: None,
            music_volume: 0.1,
            music_fade_secs: 2.0,
            crossfade_secs: 0.0,
            visual_filter: VisualFilter::None,
            intro_text: None,
            outro_text: None,
            title_card_secs: 3.0,
            title_background: "black".to_string(),
            title_color: "white".to_string(),
            subtitle: SubtitleStyle::default(),
            graphic_height_ratio: 0.8,
        }
    }
}

fn lenient_filter<'de, D>(deserializer: D) -> Result<VisualFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw {
        None => VisualFilter::None,
        Some(name) => name.parse().unwrap_or_else(|err: UnknownFilter| {
            tracing::warn!(filter = %name, "{err}; no filter applied");
            VisualFilter::None
        }),
    })
}
