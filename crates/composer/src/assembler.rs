//! Render graph assembly: runs every planning stage and lays the result out
//! on the output timeline.
//!
//! # Pipeline
//!
//! 1. **Clip** the plan's keep-list into ordered segments.
//! 2. **Index** graphics and captions by start time.
//! 3. **Place** overlays on each segment in segment-relative time.
//! 4. **Cap** the crossfade against the shortest segment.
//! 5. **Lay out** intro card, segments, outro card with output offsets.
//! 6. **Mix** audio for the final duration.

use autocut_plan_model::{AssetMap, EditPlan, MusicSource, SourceInfo, StyleConfig};

use crate::audio_mix::{plan_audio, MusicSettings};
use crate::clipper::clip_segments;
use crate::graph::{CardRole, RenderGraph, RenderUnit, SegmentUnit, TitleCard, UnitContent};
use crate::placement::{collect_events, index_events, place_overlays};
use crate::transitions::plan_transitions;

/// Configuration for the composer.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Captions must be visible strictly longer than this within a segment.
    pub min_caption_duration: f64,

    /// Safety margin kept between the crossfade and the shortest segment.
    pub crossfade_epsilon: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            min_caption_duration: 0.5,
            crossfade_epsilon: 0.1,
        }
    }
}

/// The timeline composition engine.
///
/// `compose` is a pure function of its inputs: it performs no I/O and keeps
/// no state between calls.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    config: ComposerConfig,
}

impl Composer {
    /// Create a new composer with the given configuration.
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    /// Create a composer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ComposerConfig::default())
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Compose a render graph. Never fails; every substitution made along the
    /// way is listed in `RenderGraph::recoveries`.
    pub fn compose(
        &self,
        plan: &EditPlan,
        assets: &AssetMap,
        source: &SourceInfo,
        music: Option<&MusicSource>,
        style: &StyleConfig,
    ) -> RenderGraph {
        let mut recoveries = plan.recoveries.clone();
        let source_duration = source.duration();

        let segments = clip_segments(&plan.segments, source_duration, &mut recoveries);

        let events = collect_events(plan, assets, source_duration, &mut recoveries);
        let index = index_events(events);
        let mut placed = place_overlays(&segments, &index, self.config.min_caption_duration);

        let durations: Vec<f64> = segments.iter().map(|s| s.duration()).collect();
        let transitions = plan_transitions(
            &durations,
            style.crossfade_secs,
            self.config.crossfade_epsilon,
        );
        recoveries.extend(transitions.recovery.clone());

        let count = segments.len();
        let mut units = Vec::with_capacity(count + 2);
        let mut cursor = 0.0;

        if let Some(card) = title_card(style, CardRole::Intro) {
            cursor = push_card(&mut units, card, cursor);
        }

        for (i, segment) in segments.iter().enumerate() {
            let (fade_in, fade_out) = transitions.fades_for(i, count);
            let transition_to_next = transitions.directive_after(i, count);
            let duration = segment.duration();

            units.push(RenderUnit {
                output_start: cursor,
                output_duration: duration,
                content: UnitContent::Segment(SegmentUnit {
                    index: i,
                    source: segment.span,
                    overlays: std::mem::take(&mut placed[i]),
                    fade_in,
                    fade_out,
                    transition_to_next,
                }),
            });

            cursor += duration;
            if let Some(t) = transition_to_next {
                cursor -= t.crossfade;
            }
        }

        if let Some(card) = title_card(style, CardRole::Outro) {
            cursor = push_card(&mut units, card, cursor);
        }

        let final_duration = cursor;
        let audio = plan_audio(
            source.has_audio(),
            music,
            final_duration,
            MusicSettings {
                volume: style.music_volume,
                fade_secs: style.music_fade_secs,
            },
            &mut recoveries,
        );

        let graph = RenderGraph {
            source: source.path().to_path_buf(),
            width: source.width(),
            height: source.height(),
            units,
            crossfade: transitions.crossfade,
            audio,
            visual_filter: style.visual_filter,
            subtitle_style: style.subtitle.clone(),
            graphic_height_ratio: style.graphic_height_ratio,
            duration: final_duration,
            recoveries,
        };

        tracing::info!(
            segments = count,
            overlays = graph.overlay_count(),
            crossfade = graph.crossfade,
            audio = graph.audio.label(),
            duration = graph.duration,
            recoveries = graph.recoveries.len(),
            "Composed render graph"
        );

        graph
    }
}

fn title_card(style: &StyleConfig, role: CardRole) -> Option<TitleCard> {
    let text = match role {
        CardRole::Intro => style.intro_text.as_deref(),
        CardRole::Outro => style.outro_text.as_deref(),
    };
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    if !style.title_card_secs.is_finite() || style.title_card_secs <= 0.0 {
        tracing::warn!(
            duration = style.title_card_secs,
            ?role,
            "Title card duration must be positive; card omitted"
        );
        return None;
    }
    Some(TitleCard {
        role,
        text: text.to_string(),
        duration: style.title_card_secs,
        background: style.title_background.clone(),
        color: style.title_color.clone(),
    })
}

fn push_card(units: &mut Vec<RenderUnit>, card: TitleCard, cursor: f64) -> f64 {
    let duration = card.duration;
    units.push(RenderUnit {
        output_start: cursor,
        output_duration: duration,
        content: UnitContent::TitleCard(card),
    });
    cursor + duration
}
