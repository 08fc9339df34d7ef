//! Translation of a render graph into an ffmpeg `-filter_complex` invocation.
//!
//! Input 0 is always the source video. Every placed graphic gets its own
//! looped image input, and music (if any) is added last. Title cards are
//! synthesized inside the graph from `color` and `anullsrc` sources.
//!
//! ```text
//! [0:v] trim ─ overlays ─ drawtext ─┐
//! [0:v] trim ─ overlays ─ drawtext ─┼─ xfade chain | concat ─┐
//!                 ...               ┘                        │
//! color ─ drawtext (intro) ──────────────────────────────────┼─ concat ─ visual filter ─ [vout]
//! color ─ drawtext (outro) ──────────────────────────────────┘
//! ```

use std::path::Path;

use autocut_composer::{
    AudioDirective, MusicFit, MusicPlan, OverlayContent, RenderGraph, SegmentUnit, TitleCard,
};
use autocut_plan_model::{SubtitleStyle, VisualFilter};

use crate::export::{codec_args, EncodeSettings};

/// Final video label in the filter graph.
pub const VIDEO_OUT: &str = "vout";

/// Final audio label in the filter graph.
pub const AUDIO_OUT: &str = "aout";

/// A complete ffmpeg command line for one render.
#[derive(Debug, Clone)]
pub struct FfmpegInvocation {
    /// Arguments after the `ffmpeg` binary name.
    pub args: Vec<String>,
    /// The `-filter_complex` value (also present in `args`).
    pub filter_complex: String,
    pub expected_duration: f64,
    pub total_frames: u64,
}

/// The ffmpeg filter for a visual filter, applied once to the assembled video.
pub fn visual_filter_expr(filter: VisualFilter) -> Option<&'static str> {
    match filter {
        VisualFilter::None => None,
        VisualFilter::Monochrome => Some("hue=s=0"),
        VisualFilter::InvertColors => Some("negate"),
        VisualFilter::Mirror => Some("hflip"),
        VisualFilter::Rotate90 => Some("transpose=1"),
        VisualFilter::Rotate180 => Some("hflip,vflip"),
    }
}

/// Escape text for a single-quoted `drawtext` option value.
pub fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\:"),
            '%' => escaped.push_str("\\%"),
            // A quote cannot appear inside a quoted filter argument.
            '\'' => escaped.push('\u{2019}'),
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Seconds with millisecond precision, as ffmpeg options expect.
fn secs(value: f64) -> String {
    format!("{:.3}", value.max(0.0))
}

fn even(value: f64) -> u32 {
    let rounded = value.round().max(2.0) as u32;
    rounded - rounded % 2
}

/// Build the full ffmpeg command for `graph`.
pub fn build_invocation(
    graph: &RenderGraph,
    output: &Path,
    settings: &EncodeSettings,
) -> FfmpegInvocation {
    let mut builder = GraphBuilder::new(graph, settings);
    builder.build();

    let filter_complex = builder.chains.join(";");
    let expected_duration = graph.duration;
    let total_frames = (expected_duration * settings.fps as f64).ceil().max(0.0) as u64;

    let mut args: Vec<String> = [
        "-hide_banner",
        "-nostats",
        "-y",
        "-progress",
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for input in &builder.inputs {
        args.extend(input.iter().cloned());
    }

    args.push("-filter_complex".to_string());
    args.push(filter_complex.clone());
    args.push("-map".to_string());
    args.push(format!("[{VIDEO_OUT}]"));
    args.push("-map".to_string());
    args.push(format!("[{AUDIO_OUT}]"));
    args.extend(codec_args(settings));
    args.push("-r".to_string());
    args.push(settings.fps.to_string());
    args.push("-t".to_string());
    args.push(secs(expected_duration));
    args.push(output.display().to_string());

    FfmpegInvocation {
        args,
        filter_complex,
        expected_duration,
        total_frames,
    }
}

struct GraphBuilder<'a> {
    graph: &'a RenderGraph,
    settings: &'a EncodeSettings,
    inputs: Vec<Vec<String>>,
    chains: Vec<String>,
}

impl<'a> GraphBuilder<'a> {
    fn new(graph: &'a RenderGraph, settings: &'a EncodeSettings) -> Self {
        let source = vec!["-i".to_string(), graph.source.display().to_string()];
        Self {
            graph,
            settings,
            inputs: vec![source],
            chains: Vec::new(),
        }
    }

    fn add_input(&mut self, args: Vec<String>) -> usize {
        self.inputs.push(args);
        self.inputs.len() - 1
    }

    fn audio_format(&self) -> String {
        format!(
            "aresample={},aformat=sample_fmts=fltp:channel_layouts=stereo",
            self.settings.sample_rate
        )
    }

    fn video_format(&self) -> String {
        format!(
            "scale={}:{},setsar=1,fps={},format=yuv420p",
            self.graph.width, self.graph.height, self.settings.fps
        )
    }

    fn build(&mut self) {
        let graph = self.graph;
        let with_original = graph.audio.uses_original();

        let (body_v, body_a) = self.build_segments(with_original);

        // Units in output order: intro card, segment body, outro card.
        let mut parts: Vec<(String, Option<String>)> = Vec::new();
        let mut body_pushed = false;
        for (i, unit) in graph.units.iter().enumerate() {
            match unit.as_card() {
                Some(card) => {
                    let labels = self.build_card(card, i, with_original);
                    parts.push(labels);
                }
                None if !body_pushed => {
                    parts.push((body_v.clone(), body_a.clone()));
                    body_pushed = true;
                }
                None => {}
            }
        }

        let (joined_v, joined_a) = if parts.len() == 1 {
            (body_v, body_a)
        } else {
            self.concat(&parts, "joined", with_original)
        };

        let filter = visual_filter_expr(graph.visual_filter).unwrap_or("null");
        self.chains.push(format!("[{joined_v}]{filter}[{VIDEO_OUT}]"));

        self.build_audio(joined_a);
    }

    /// Cut, decorate and join the segment units. Returns the body labels.
    fn build_segments(&mut self, with_original: bool) -> (String, Option<String>) {
        let graph = self.graph;
        let segments: Vec<(f64, &SegmentUnit)> = graph
            .units
            .iter()
            .filter_map(|unit| unit.as_segment().map(|s| (unit.output_start, s)))
            .collect();

        let mut labels = Vec::with_capacity(segments.len());
        for (_, segment) in &segments {
            let video = self.build_segment_video(segment);
            let audio = with_original.then(|| self.build_segment_audio(segment));
            labels.push((video, audio));
        }

        if labels.len() == 1 {
            return labels.remove(0);
        }

        if graph.crossfade <= 0.0 {
            return self.concat(&labels, "body", with_original);
        }

        // Crossfade chain: each offset is where the next segment begins
        // relative to the first segment on the output timeline.
        let body_start = segments.first().map(|(start, _)| *start).unwrap_or(0.0);
        let fade = secs(graph.crossfade);
        let (mut video, mut audio) = labels[0].clone();
        for (i, (next_v, next_a)) in labels.iter().enumerate().skip(1) {
            let offset = segments[i].0 - body_start;
            let out_v = format!("xv{i}");
            self.chains.push(format!(
                "[{video}][{next_v}]xfade=transition=fade:duration={fade}:offset={}[{out_v}]",
                secs(offset)
            ));
            video = out_v;

            if let (Some(current), Some(next)) = (&audio, next_a) {
                let out_a = format!("xa{i}");
                self.chains.push(format!(
                    "[{current}][{next}]acrossfade=d={fade}:c1=tri:c2=tri[{out_a}]"
                ));
                audio = Some(out_a);
            }
        }
        (video, audio)
    }

    fn build_segment_video(&mut self, segment: &SegmentUnit) -> String {
        let i = segment.index;
        let mut current = format!("s{i}v");
        self.chains.push(format!(
            "[0:v]trim=start={}:end={},setpts=PTS-STARTPTS,{}[{current}]",
            secs(segment.source.start),
            secs(segment.source.end),
            self.video_format()
        ));

        let graphic_height = even(self.graph.height as f64 * self.graph.graphic_height_ratio);
        for (j, placed) in segment.overlays.iter().enumerate() {
            let enable = format!(
                "enable='between(t,{},{})'",
                secs(placed.relative_start),
                secs(placed.relative_end())
            );
            let next = format!("s{i}o{j}");

            match &placed.event.content {
                OverlayContent::Graphic { asset } => {
                    let input = self.add_input(vec![
                        "-loop".to_string(),
                        "1".to_string(),
                        "-t".to_string(),
                        secs(segment.duration()),
                        "-i".to_string(),
                        asset.display().to_string(),
                    ]);
                    let image = format!("g{i}o{j}");
                    self.chains.push(format!(
                        "[{input}:v]scale=-2:{graphic_height},format=rgba[{image}]"
                    ));
                    self.chains.push(format!(
                        "[{current}][{image}]overlay=x=(W-w)/2:y=(H-h)/2:{enable}[{next}]"
                    ));
                }
                OverlayContent::Caption { text } => {
                    let drawtext =
                        caption_drawtext(text, &self.graph.subtitle_style, self.graph.height);
                    self.chains
                        .push(format!("[{current}]{drawtext}:{enable}[{next}]"));
                }
            }
            current = next;
        }

        tracing::debug!(
            segment = i,
            overlays = segment.overlays.len(),
            "Built segment filter chain"
        );
        current
    }

    fn build_segment_audio(&mut self, segment: &SegmentUnit) -> String {
        let label = format!("s{}a", segment.index);
        self.chains.push(format!(
            "[0:a]atrim=start={}:end={},asetpts=PTS-STARTPTS,{}[{label}]",
            secs(segment.source.start),
            secs(segment.source.end),
            self.audio_format()
        ));
        label
    }

    fn build_card(
        &mut self,
        card: &TitleCard,
        position: usize,
        with_audio: bool,
    ) -> (String, Option<String>) {
        let video = format!("card{position}v");
        self.chains.push(format!(
            "color=c={}:s={}x{}:r={}:d={},setsar=1,format=yuv420p,\
             drawtext=text='{}':fontcolor={}:fontsize={}:x=(w-text_w)/2:y=(h-text_h)/2[{video}]",
            card.background,
            self.graph.width,
            self.graph.height,
            self.settings.fps,
            secs(card.duration),
            escape_drawtext(&card.text),
            card.color,
            title_font_size(self.graph.height),
        ));

        let audio = with_audio.then(|| {
            let label = format!("card{position}a");
            self.chains.push(format!(
                "anullsrc=r={}:cl=stereo,atrim=duration={},{}[{label}]",
                self.settings.sample_rate,
                secs(card.duration),
                self.audio_format()
            ));
            label
        });
        (video, audio)
    }

    fn concat(
        &mut self,
        parts: &[(String, Option<String>)],
        name: &str,
        with_audio: bool,
    ) -> (String, Option<String>) {
        let mut inputs = String::new();
        for (video, audio) in parts {
            inputs.push_str(&format!("[{video}]"));
            if let (true, Some(audio)) = (with_audio, audio) {
                inputs.push_str(&format!("[{audio}]"));
            }
        }

        let video = format!("{name}v");
        if with_audio {
            let audio = format!("{name}a");
            self.chains.push(format!(
                "{inputs}concat=n={}:v=1:a=1[{video}][{audio}]",
                parts.len()
            ));
            (video, Some(audio))
        } else {
            self.chains
                .push(format!("{inputs}concat=n={}:v=1:a=0[{video}]", parts.len()));
            (video, None)
        }
    }

    fn build_audio(&mut self, original: Option<String>) {
        let graph = self.graph;
        let duration = secs(graph.duration);
        match (&graph.audio, original) {
            (AudioDirective::PassThrough, Some(original)) => {
                self.chains.push(format!("[{original}]anull[{AUDIO_OUT}]"));
            }
            (AudioDirective::MusicOnly(plan), _) => {
                let music = self.build_music(plan);
                self.chains.push(format!("[{music}]anull[{AUDIO_OUT}]"));
            }
            (AudioDirective::Mixed(plan), Some(original)) => {
                let music = self.build_music(plan);
                self.chains.push(format!(
                    "[{original}][{music}]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[{AUDIO_OUT}]"
                ));
            }
            _ => {
                self.chains.push(format!(
                    "anullsrc=r={}:cl=stereo,atrim=duration={duration},{}[{AUDIO_OUT}]",
                    self.settings.sample_rate,
                    self.audio_format()
                ));
            }
        }
    }

    fn build_music(&mut self, plan: &MusicPlan) -> String {
        let mut args = Vec::new();
        if let MusicFit::Loop { .. } = plan.fit {
            args.extend(["-stream_loop".to_string(), "-1".to_string()]);
        }
        args.extend(["-i".to_string(), plan.path.display().to_string()]);
        let input = self.add_input(args);

        let mut chain = format!(
            "[{input}:a]atrim=duration={},asetpts=PTS-STARTPTS,{},volume={:.3}",
            secs(plan.target_duration),
            self.audio_format(),
            plan.gain
        );
        if plan.fade_in > 0.0 {
            chain.push_str(&format!(",afade=t=in:st=0:d={}", secs(plan.fade_in)));
        }
        if plan.fade_out > 0.0 {
            chain.push_str(&format!(
                ",afade=t=out:st={}:d={}",
                secs(plan.target_duration - plan.fade_out),
                secs(plan.fade_out)
            ));
        }
        chain.push_str("[music]");
        self.chains.push(chain);
        "music".to_string()
    }
}

fn title_font_size(height: u32) -> u32 {
    (height / 12).max(16)
}

/// `drawtext` filter for a burned-in caption at bottom center.
fn caption_drawtext(text: &str, style: &SubtitleStyle, height: u32) -> String {
    let margin = (height as f64 * 0.05).round() as u32;
    let mut filter = format!(
        "drawtext=text='{}':font='{}':fontsize={}:fontcolor={}:borderw={}:bordercolor={}:x=(w-text_w)/2:y=h-text_h-{margin}",
        escape_drawtext(text),
        escape_drawtext(&style.font),
        style.font_size,
        style.color,
        style.stroke_width,
        style.stroke_color,
    );
    if let Some(box_color) = &style.box_color {
        let opacity = style.box_opacity.unwrap_or(1.0).clamp(0.0, 1.0);
        filter.push_str(&format!(
            ":box=1:boxcolor={box_color}@{opacity:.2}:boxborderw=10"
        ));
    }
    filter
}
