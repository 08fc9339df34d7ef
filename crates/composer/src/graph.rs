//! The render graph handed to the rendering backend.

use std::path::PathBuf;

use autocut_plan_model::{Recovery, SubtitleStyle, TimeSpan, VisualFilter};
use serde::Serialize;

use crate::audio_mix::AudioDirective;
use crate::placement::{OverlayContent, PlacedOverlay};
use crate::transitions::TransitionDirective;

/// Position of a title card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardRole {
    Intro,
    Outro,
}

/// Plain text on a solid background, sized to the main video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleCard {
    pub role: CardRole,
    pub text: String,
    pub duration: f64,
    pub background: String,
    pub color: String,
}

/// One kept segment with everything drawn over it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentUnit {
    /// Position among segment units (0-based).
    pub index: usize,
    /// Source-timeline interval to cut.
    pub source: TimeSpan,
    /// Overlays in segment-relative time.
    pub overlays: Vec<PlacedOverlay>,
    pub fade_in: f64,
    pub fade_out: f64,
    pub transition_to_next: Option<TransitionDirective>,
}

impl SegmentUnit {
    pub fn duration(&self) -> f64 {
        self.source.duration()
    }
}

/// What a render unit draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnitContent {
    TitleCard(TitleCard),
    Segment(SegmentUnit),
}

/// A unit placed on the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderUnit {
    /// Where the unit begins in the output, after crossfade overlap.
    pub output_start: f64,
    pub output_duration: f64,
    pub content: UnitContent,
}

impl RenderUnit {
    pub fn as_segment(&self) -> Option<&SegmentUnit> {
        match &self.content {
            UnitContent::Segment(segment) => Some(segment),
            UnitContent::TitleCard(_) => None,
        }
    }

    pub fn as_card(&self) -> Option<&TitleCard> {
        match &self.content {
            UnitContent::TitleCard(card) => Some(card),
            UnitContent::Segment(_) => None,
        }
    }
}

/// A caption resolved onto the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedCaption {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// The fully resolved instruction set for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderGraph {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Intro card, segment units, outro card, in output order.
    pub units: Vec<RenderUnit>,
    /// Crossfade between adjacent segment units (0 means hard cuts).
    pub crossfade: f64,
    pub audio: AudioDirective,
    /// Applied once to the assembled video.
    pub visual_filter: VisualFilter,
    pub subtitle_style: SubtitleStyle,
    pub graphic_height_ratio: f64,
    /// Total output length in seconds.
    pub duration: f64,
    pub recoveries: Vec<Recovery>,
}

impl RenderGraph {
    pub fn segments(&self) -> impl Iterator<Item = &SegmentUnit> {
        self.units.iter().filter_map(RenderUnit::as_segment)
    }

    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    pub fn intro(&self) -> Option<&TitleCard> {
        self.units
            .first()
            .and_then(RenderUnit::as_card)
            .filter(|card| card.role == CardRole::Intro)
    }

    pub fn outro(&self) -> Option<&TitleCard> {
        self.units
            .last()
            .and_then(RenderUnit::as_card)
            .filter(|card| card.role == CardRole::Outro)
    }

    pub fn overlay_count(&self) -> usize {
        self.segments().map(|s| s.overlays.len()).sum()
    }

    /// Placed captions on the output timeline, ordered by start.
    pub fn timed_captions(&self) -> Vec<TimedCaption> {
        let mut captions: Vec<TimedCaption> = self
            .units
            .iter()
            .filter_map(|unit| unit.as_segment().map(|segment| (unit.output_start, segment)))
            .flat_map(|(offset, segment)| {
                segment.overlays.iter().filter_map(move |placed| match &placed.event.content {
                    OverlayContent::Caption { text } => Some(TimedCaption {
                        start: offset + placed.relative_start,
                        end: offset + placed.relative_end(),
                        text: text.clone(),
                    }),
                    OverlayContent::Graphic { .. } => None,
                })
            })
            .collect();
        captions.sort_by(|a, b| a.start.total_cmp(&b.start));
        captions
    }
}
