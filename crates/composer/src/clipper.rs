//! Segment clipping: raw keep-list → ordered, playable segments.

use autocut_plan_model::{IntervalKind, Recovery, SegmentSpec, TimeSpan};
use serde::Serialize;

/// A retained piece of the source video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeepSegment {
    /// Source-timeline interval.
    pub span: TimeSpan,

    /// Index into the plan's segment list; `None` for the whole-source fallback.
    pub plan_index: Option<usize>,
}

impl KeepSegment {
    pub fn duration(&self) -> f64 {
        self.span.duration()
    }
}

/// Clamp, drop, and order the plan's segments.
///
/// Segments are clamped to `[0, source_duration]`; empty results are dropped;
/// survivors are sorted by start (ties keep plan order). Overlapping segments
/// are kept as-is. If nothing survives, one segment spanning the whole source
/// is returned, so the output is never empty.
pub fn clip_segments(
    specs: &[SegmentSpec],
    source_duration: f64,
    recoveries: &mut Vec<Recovery>,
) -> Vec<KeepSegment> {
    let mut kept: Vec<KeepSegment> = Vec::with_capacity(specs.len());

    for (i, spec) in specs.iter().enumerate() {
        let end = spec.end.unwrap_or(source_duration);
        let clamped = if spec.start.is_nan() || end.is_nan() {
            None
        } else {
            TimeSpan::new(spec.start.max(0.0), end.min(source_duration))
        };

        match clamped {
            Some(span) => kept.push(KeepSegment {
                span,
                plan_index: Some(i),
            }),
            None => {
                tracing::debug!(
                    segment = i,
                    start = spec.start,
                    end,
                    "Dropping degenerate segment"
                );
                recoveries.push(Recovery::DegenerateInterval {
                    interval: IntervalKind::Segment,
                    index: i,
                });
            }
        }
    }

    kept.sort_by(|a, b| a.span.start.total_cmp(&b.span.start));

    if kept.is_empty() {
        if !specs.is_empty() {
            let recovery =
                Recovery::malformed("segments", "no playable segment; whole source used");
            tracing::warn!(%recovery, "Falling back to full source");
            recoveries.push(recovery);
        }
        if let Some(span) = TimeSpan::new(0.0, source_duration) {
            kept.push(KeepSegment {
                span,
                plan_index: None,
            });
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: Option<f64>) -> SegmentSpec {
        SegmentSpec { start, end }
    }

    fn spans(segments: &[KeepSegment]) -> Vec<(f64, f64)> {
        segments.iter().map(|s| (s.span.start, s.span.end)).collect()
    }

    #[test]
    fn test_empty_plan_yields_whole_source() {
        let mut recoveries = Vec::new();
        let out = clip_segments(&[], 42.0, &mut recoveries);
        assert_eq!(spans(&out), vec![(0.0, 42.0)]);
        assert_eq!(out[0].plan_index, None);
        assert!(recoveries.is_empty());
    }

    #[test]
    fn test_clamps_sorts_and_drops() {
        let mut recoveries = Vec::new();
        let out = clip_segments(
            &[
                seg(8.0, Some(50.0)),
                seg(-3.0, Some(2.0)),
                seg(5.0, Some(5.0)),
                seg(12.0, Some(15.0)),
            ],
            10.0,
            &mut recoveries,
        );
        assert_eq!(spans(&out), vec![(0.0, 2.0), (8.0, 10.0)]);
        assert_eq!(out[0].plan_index, Some(1));
        assert_eq!(recoveries.len(), 2);
    }

    #[test]
    fn test_missing_end_runs_to_source_end() {
        let mut recoveries = Vec::new();
        let out = clip_segments(&[seg(3.0, None)], 9.5, &mut recoveries);
        assert_eq!(spans(&out), vec![(3.0, 9.5)]);
    }

    #[test]
    fn test_overlapping_segments_are_kept() {
        let mut recoveries = Vec::new();
        let out = clip_segments(
            &[seg(4.0, Some(8.0)), seg(2.0, Some(6.0)), seg(4.0, Some(5.0))],
            10.0,
            &mut recoveries,
        );
        assert_eq!(spans(&out), vec![(2.0, 6.0), (4.0, 8.0), (4.0, 5.0)]);
    }

    #[test]
    fn test_all_degenerate_falls_back() {
        let mut recoveries = Vec::new();
        let out = clip_segments(
            &[seg(7.0, Some(3.0)), seg(f64::NAN, Some(3.0))],
            20.0,
            &mut recoveries,
        );
        assert_eq!(spans(&out), vec![(0.0, 20.0)]);
        assert!(recoveries
            .iter()
            .any(|r| matches!(r, Recovery::PlanMalformed { field, .. } if field == "segments")));
    }
}
