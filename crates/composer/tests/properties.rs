use autocut_composer::{AudioDirective, Composer, OverlayContent, RenderGraph};
use autocut_plan_model::{
    AssetMap, CaptionSpec, EditPlan, GraphicSpec, MusicSource, SegmentSpec, SourceInfo,
    StyleConfig, TimeSpan,
};
use proptest::prelude::*;

const SOURCE_DURATION: f64 = 60.0;
const EPSILON: f64 = 0.1;

fn segment_strategy() -> impl Strategy<Value = SegmentSpec> {
    (-5.0..65.0f64, 0.0..20.0f64).prop_map(|(start, len)| SegmentSpec {
        start,
        end: Some(start + len),
    })
}

fn graphic_strategy() -> impl Strategy<Value = GraphicSpec> {
    (-2.0..62.0f64, 0.1..10.0f64).prop_map(|(timestamp, duration)| GraphicSpec {
        timestamp,
        duration,
        prompt: Some("p".to_string()),
    })
}

fn caption_strategy() -> impl Strategy<Value = CaptionSpec> {
    (0.0..60.0f64, 0.0..6.0f64).prop_map(|(start, len)| CaptionSpec {
        start,
        end: start + len,
        text: "caption".to_string(),
    })
}

fn plan_strategy() -> impl Strategy<Value = EditPlan> {
    (
        prop::collection::vec(segment_strategy(), 0..6),
        prop::collection::vec(graphic_strategy(), 0..5),
        prop::collection::vec(caption_strategy(), 0..5),
    )
        .prop_map(|(segments, graphics, captions)| EditPlan {
            segments,
            graphics,
            captions,
            ..EditPlan::default()
        })
}

fn all_assets(plan: &EditPlan) -> AssetMap {
    let mut assets = AssetMap::new();
    for i in 0..plan.graphics.len() {
        assets.insert(i, format!("/tmp/graphic_{i}.png"));
    }
    assets
}

fn compose(plan: &EditPlan, crossfade: f64) -> RenderGraph {
    let source = SourceInfo::new("/media/in.mp4", SOURCE_DURATION, 1280, 720, true).unwrap();
    let style = StyleConfig {
        crossfade_secs: crossfade,
        ..StyleConfig::default()
    };
    Composer::with_defaults().compose(plan, &all_assets(plan), &source, None, &style)
}

proptest! {
    #[test]
    fn composing_twice_is_identical(plan in plan_strategy(), crossfade in 0.0..3.0f64) {
        prop_assert_eq!(compose(&plan, crossfade), compose(&plan, crossfade));
    }

    #[test]
    fn never_an_empty_graph(plan in plan_strategy()) {
        let graph = compose(&plan, 0.0);
        prop_assert!(graph.segment_count() >= 1);
        prop_assert!(graph.duration > 0.0);
    }

    #[test]
    fn placements_stay_inside_their_segment(plan in plan_strategy()) {
        let graph = compose(&plan, 0.0);
        for segment in graph.segments() {
            for placed in &segment.overlays {
                prop_assert!(placed.relative_start >= 0.0);
                prop_assert!(placed.relative_duration > 0.0);
                prop_assert!(placed.relative_end() <= segment.duration() + 1e-9);
            }
        }
    }

    #[test]
    fn graphic_coverage_matches_segment_overlap(plan in plan_strategy()) {
        let graph = compose(&plan, 0.0);
        for (i, graphic) in plan.graphics.iter().enumerate() {
            let Some(span) = TimeSpan::new(graphic.timestamp, graphic.timestamp + graphic.duration)
                .and_then(|s| s.clamp_to(0.0, SOURCE_DURATION))
            else {
                continue;
            };

            let expected: f64 = graph
                .segments()
                .filter_map(|s| s.source.intersection(&span))
                .map(|shared| shared.duration())
                .sum();
            let placed: f64 = graph
                .segments()
                .flat_map(|s| s.overlays.iter())
                .filter(|o| {
                    o.event.plan_index == i
                        && matches!(o.event.content, OverlayContent::Graphic { .. })
                })
                .map(|o| o.relative_duration)
                .sum();

            prop_assert!((expected - placed).abs() < 1e-6, "graphic {}: {} vs {}", i, expected, placed);
        }
    }

    #[test]
    fn crossfade_is_capped_by_shortest_segment(plan in plan_strategy(), requested in 0.0..5.0f64) {
        let graph = compose(&plan, requested);
        let durations: Vec<f64> = graph.segments().map(|s| s.duration()).collect();

        let expected = if durations.len() < 2 || requested <= 0.0 {
            0.0
        } else {
            let shortest = durations.iter().copied().fold(f64::INFINITY, f64::min);
            requested.min(shortest - EPSILON).max(0.0)
        };

        prop_assert!(graph.crossfade >= 0.0);
        prop_assert!((graph.crossfade - expected).abs() < 1e-9);
    }

    #[test]
    fn audio_table_is_total(
        has_audio in any::<bool>(),
        music_len in prop::option::of(-1.0..120.0f64),
    ) {
        let source = SourceInfo::new("/media/in.mp4", 30.0, 640, 360, has_audio).unwrap();
        let music = music_len.map(|len| MusicSource::new("/media/bed.mp3", len));
        let graph = Composer::with_defaults().compose(
            &EditPlan::default(),
            &AssetMap::new(),
            &source,
            music.as_ref(),
            &StyleConfig::default(),
        );

        let usable_music = music.as_ref().map(MusicSource::is_usable).unwrap_or(false);
        let expected_variant = match (has_audio, usable_music) {
            (false, false) => "silence",
            (true, false) => "pass-through",
            (false, true) => "music only",
            (true, true) => "mixed",
        };
        prop_assert_eq!(graph.audio.label(), expected_variant);
        if let Some(plan) = graph.audio.music() {
            prop_assert!(plan.fade_in <= graph.duration / 2.0 + 1e-9);
            prop_assert!(matches!(graph.audio, AudioDirective::MusicOnly(_) | AudioDirective::Mixed(_)));
        }
    }
}
