//! Overlay placement: project graphics and captions onto keep-segments.
//!
//! An event that overlaps several segments is placed once per segment, each
//! with its own segment-relative start and duration.

use std::path::PathBuf;

use autocut_plan_model::{AssetMap, EditPlan, IntervalKind, Recovery, TimeSpan};
use serde::Serialize;

use crate::clipper::KeepSegment;
use crate::interval_index::IntervalIndex;

/// What an overlay shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayContent {
    Graphic { asset: PathBuf },
    Caption { text: String },
}

/// An overlay on the source timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayEvent {
    /// Index into the plan's graphics or captions list.
    pub plan_index: usize,
    pub span: TimeSpan,
    pub content: OverlayContent,
}

impl OverlayEvent {
    pub fn is_caption(&self) -> bool {
        matches!(self.content, OverlayContent::Caption { .. })
    }
}

/// An overlay projected onto one segment, in segment-relative seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOverlay {
    pub segment_index: usize,
    pub relative_start: f64,
    pub relative_duration: f64,
    pub event: OverlayEvent,
}

impl PlacedOverlay {
    pub fn relative_end(&self) -> f64 {
        self.relative_start + self.relative_duration
    }
}

/// Turn the plan's graphics and captions into overlay events.
///
/// Spans are clamped to `[0, source_duration]`. Empty spans and graphics
/// without an asset are dropped and recorded.
pub fn collect_events(
    plan: &EditPlan,
    assets: &AssetMap,
    source_duration: f64,
    recoveries: &mut Vec<Recovery>,
) -> Vec<OverlayEvent> {
    let mut events = Vec::with_capacity(plan.graphics.len() + plan.captions.len());

    for (i, graphic) in plan.graphics.iter().enumerate() {
        let span = TimeSpan::new(graphic.timestamp, graphic.timestamp + graphic.duration)
            .and_then(|s| s.clamp_to(0.0, source_duration));
        let Some(span) = span else {
            tracing::debug!(graphic = i, "Dropping graphic with empty span");
            recoveries.push(Recovery::DegenerateInterval {
                interval: IntervalKind::Graphic,
                index: i,
            });
            continue;
        };
        let Some(asset) = assets.get(i) else {
            tracing::warn!(graphic = i, "No asset for graphic; skipping its placements");
            recoveries.push(Recovery::AssetMissing { graphic_index: i });
            continue;
        };
        events.push(OverlayEvent {
            plan_index: i,
            span,
            content: OverlayContent::Graphic {
                asset: asset.to_path_buf(),
            },
        });
    }

    for (i, caption) in plan.captions.iter().enumerate() {
        if caption.text.trim().is_empty() {
            tracing::debug!(caption = i, "Skipping caption without text");
            continue;
        }
        let span =
            TimeSpan::new(caption.start, caption.end).and_then(|s| s.clamp_to(0.0, source_duration));
        let Some(span) = span else {
            tracing::debug!(caption = i, "Dropping caption with empty span");
            recoveries.push(Recovery::DegenerateInterval {
                interval: IntervalKind::Caption,
                index: i,
            });
            continue;
        };
        events.push(OverlayEvent {
            plan_index: i,
            span,
            content: OverlayContent::Caption {
                text: caption.text.clone(),
            },
        });
    }

    events
}

/// Place every indexed event on every segment it overlaps.
///
/// Returns one overlay list per segment, in segment order. Captions shorter
/// than `min_caption_duration` within a segment are not placed.
pub fn place_overlays(
    segments: &[KeepSegment],
    index: &IntervalIndex<OverlayEvent>,
    min_caption_duration: f64,
) -> Vec<Vec<PlacedOverlay>> {
    segments
        .iter()
        .enumerate()
        .map(|(segment_index, segment)| {
            let s = segment.span.start;
            let e = segment.span.end;
            let length = segment.duration();

            index
                .overlapping(&segment.span)
                .filter_map(|(span, event)| {
                    let overlap_start = span.start.max(s);
                    let overlap_end = span.end.min(e);
                    let relative_start = (span.start - s).max(0.0);
                    let mut duration = overlap_end - overlap_start;

                    if relative_start + duration > length {
                        duration = length - relative_start;
                    }
                    if duration <= 0.0 {
                        return None;
                    }
                    if event.is_caption() && duration <= min_caption_duration {
                        tracing::debug!(
                            caption = event.plan_index,
                            segment = segment_index,
                            duration,
                            "Caption sliver below minimum duration"
                        );
                        return None;
                    }

                    Some(PlacedOverlay {
                        segment_index,
                        relative_start,
                        relative_duration: duration,
                        event: event.clone(),
                    })
                })
                .collect()
        })
        .collect()
}

/// Build the interval index over overlay events.
pub fn index_events(events: Vec<OverlayEvent>) -> IntervalIndex<OverlayEvent> {
    IntervalIndex::build(events.into_iter().map(|e| (e.span, e)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocut_plan_model::{CaptionSpec, GraphicSpec};

    fn segment(start: f64, end: f64) -> KeepSegment {
        KeepSegment {
            span: TimeSpan::new(start, end).unwrap(),
            plan_index: None,
        }
    }

    fn graphic(timestamp: f64, duration: f64) -> GraphicSpec {
        GraphicSpec {
            timestamp,
            duration,
            prompt: Some("p".to_string()),
        }
    }

    fn caption(start: f64, end: f64, text: &str) -> CaptionSpec {
        CaptionSpec {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_graphic_without_asset_is_skipped() {
        let plan = EditPlan {
            graphics: vec![graphic(1.0, 2.0), graphic(3.0, 2.0)],
            ..EditPlan::default()
        };
        let mut assets = AssetMap::new();
        assets.insert(1, "/tmp/g1.png");

        let mut recoveries = Vec::new();
        let events = collect_events(&plan, &assets, 10.0, &mut recoveries);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].plan_index, 1);
        assert_eq!(recoveries, vec![Recovery::AssetMissing { graphic_index: 0 }]);
    }

    #[test]
    fn test_event_spans_clamped_to_source() {
        let plan = EditPlan {
            captions: vec![caption(8.0, 15.0, "tail"), caption(12.0, 14.0, "gone")],
            ..EditPlan::default()
        };
        let mut recoveries = Vec::new();
        let events = collect_events(&plan, &AssetMap::new(), 10.0, &mut recoveries);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].span, TimeSpan::new(8.0, 10.0).unwrap());
        assert_eq!(recoveries.len(), 1);
    }

    #[test]
    fn test_graphic_spanning_two_segments() {
        let plan = EditPlan {
            graphics: vec![graphic(4.0, 3.0)],
            ..EditPlan::default()
        };
        let mut assets = AssetMap::new();
        assets.insert(0, "/tmp/g0.png");
        let mut recoveries = Vec::new();
        let index = index_events(collect_events(&plan, &assets, 10.0, &mut recoveries));

        let placed = place_overlays(&[segment(0.0, 5.0), segment(5.0, 10.0)], &index, 0.5);
        assert_eq!(placed[0].len(), 1);
        assert!((placed[0][0].relative_start - 4.0).abs() < 1e-9);
        assert!((placed[0][0].relative_duration - 1.0).abs() < 1e-9);
        assert_eq!(placed[1].len(), 1);
        assert!((placed[1][0].relative_start - 0.0).abs() < 1e-9);
        assert!((placed[1][0].relative_duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_caption_sliver_suppressed_but_graphic_kept() {
        let plan = EditPlan {
            graphics: vec![graphic(4.7, 1.0)],
            captions: vec![caption(4.7, 6.0, "hello")],
            ..EditPlan::default()
        };
        let mut assets = AssetMap::new();
        assets.insert(0, "/tmp/g0.png");
        let mut recoveries = Vec::new();
        let index = index_events(collect_events(&plan, &assets, 10.0, &mut recoveries));

        let placed = place_overlays(&[segment(0.0, 5.0)], &index, 0.5);
        assert_eq!(placed[0].len(), 1);
        assert!(!placed[0][0].event.is_caption());
    }

    #[test]
    fn test_caption_exactly_at_threshold_is_dropped() {
        let plan = EditPlan {
            captions: vec![caption(0.0, 0.5, "blink")],
            ..EditPlan::default()
        };
        let mut recoveries = Vec::new();
        let index = index_events(collect_events(&plan, &AssetMap::new(), 10.0, &mut recoveries));
        let placed = place_overlays(&[segment(0.0, 10.0)], &index, 0.5);
        assert!(placed[0].is_empty());
    }

    #[test]
    fn test_empty_caption_text_ignored() {
        let plan = EditPlan {
            captions: vec![caption(0.0, 3.0, "   ")],
            ..EditPlan::default()
        };
        let mut recoveries = Vec::new();
        let events = collect_events(&plan, &AssetMap::new(), 10.0, &mut recoveries);
        assert!(events.is_empty());
    }
}
