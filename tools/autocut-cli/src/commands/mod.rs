pub mod check;
pub mod compose;
pub mod generate;
pub mod info;
pub mod init;
pub mod render;
pub mod subtitles;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use autocut_composer::{Composer, RenderGraph};
use autocut_plan_model::{AssetMap, LoadedJob, MusicSource, StyleConfig};
use autocut_render_engine::probe::{probe_music, probe_source};

pub(crate) fn load_job(path: &Path) -> anyhow::Result<LoadedJob> {
    LoadedJob::load(path).map_err(|e| anyhow::anyhow!("Failed to load job: {e}"))
}

/// Probe the job's media, discover its graphics, and compose with `style`.
pub(crate) fn compose_job(job: &LoadedJob, style: &StyleConfig) -> anyhow::Result<RenderGraph> {
    let source_path = job
        .source_path()
        .context("No source video set in job.json")?;
    let source = probe_source(&source_path)
        .with_context(|| format!("Failed to probe source {}", source_path.display()))?;

    // An unreadable music file becomes an unusable track, which the
    // composer records instead of failing.
    let music = style.music.as_ref().map(|path| {
        let path = job.resolve(path);
        probe_music(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Could not probe music");
            MusicSource::new(path, 0.0)
        })
    });

    let mut assets = AssetMap::discover(job.graphics_dir(), job.plan.graphics.len())
        .with_context(|| format!("Failed to scan {}", job.graphics_dir().display()))?;
    let missing = assets.retain_existing();
    if !missing.is_empty() {
        tracing::warn!(?missing, "Dropped graphics whose files disappeared");
    }

    Ok(Composer::with_defaults().compose(&job.plan, &assets, &source, music.as_ref(), style))
}

pub(crate) fn print_recoveries(graph: &RenderGraph) {
    if graph.recoveries.is_empty() {
        return;
    }
    println!("Adjustments ({}):", graph.recoveries.len());
    for recovery in &graph.recoveries {
        println!("  - {recovery}");
    }
}
