//! Render a job to video.

use std::path::PathBuf;

use autocut_common::AppConfig;
use autocut_plan_model::{StyleConfig, VisualFilter};
use autocut_render_engine::{
    render_graph, EncodeSettings, RenderJob, RenderProgress, RenderStage, SubtitleFormat,
};

use super::{compose_job, load_job, print_recoveries};

/// Style options given on the command line; they win over `job.json`.
#[derive(Debug, Default)]
pub struct StyleOverrides {
    pub crossfade: Option<f64>,
    pub filter: Option<VisualFilter>,
    pub music: Option<PathBuf>,
    pub music_volume: Option<f64>,
    pub intro: Option<String>,
    pub outro: Option<String>,
}

impl StyleOverrides {
    pub fn apply(self, base: &StyleConfig) -> StyleConfig {
        let mut style = base.clone();
        if let Some(crossfade) = self.crossfade {
            style.crossfade_secs = crossfade;
        }
        if let Some(filter) = self.filter {
            style.visual_filter = filter;
        }
        if let Some(music) = self.music {
            style.music = Some(std::fs::canonicalize(&music).unwrap_or(music));
        }
        if let Some(volume) = self.music_volume {
            style.music_volume = volume;
        }
        if self.intro.is_some() {
            style.intro_text = self.intro;
        }
        if self.outro.is_some() {
            style.outro_text = self.outro;
        }
        style
    }
}

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    overrides: StyleOverrides,
    subtitles: Option<SubtitleFormat>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Rendering job at: {}", path.display());

    let job = load_job(&path)?;
    let style = overrides.apply(&job.manifest.style);
    let graph = compose_job(&job, &style)?;

    let output_path = output.unwrap_or_else(|| job.output_path());
    println!("  Output: {}", output_path.display());
    println!(
        "  Units: {} ({} segments), duration {:.2}s",
        graph.units.len(),
        graph.segment_count(),
        graph.duration
    );
    println!("  Audio: {}", graph.audio.label());
    print_recoveries(&graph);

    let job = RenderJob {
        graph,
        output_path: output_path.clone(),
        settings: EncodeSettings::from(&config.render),
        subtitles,
    };

    let progress_cb: Box<dyn Fn(RenderProgress) + Send> = Box::new(|p| {
        if p.stage == RenderStage::Rendering {
            print!(
                "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
                p.progress * 100.0,
                p.frames_rendered,
                p.total_frames,
                p.eta_secs,
            );
        }
    });

    render_graph(job, Some(progress_cb))
        .await
        .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

    println!("\nRender complete: {}", output_path.display());
    if let Some(format) = subtitles {
        println!(
            "Subtitles: {}",
            output_path.with_extension(format.extension()).display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let base = StyleConfig {
            crossfade_secs: 0.5,
            intro_text: Some("Hello".to_string()),
            ..StyleConfig::default()
        };
        let style = StyleOverrides {
            filter: Some(VisualFilter::Monochrome),
            outro: Some("Thanks".to_string()),
            ..StyleOverrides::default()
        }
        .apply(&base);

        assert_eq!(style.crossfade_secs, 0.5);
        assert_eq!(style.visual_filter, VisualFilter::Monochrome);
        assert_eq!(style.intro_text.as_deref(), Some("Hello"));
        assert_eq!(style.outro_text.as_deref(), Some("Thanks"));
    }
}
