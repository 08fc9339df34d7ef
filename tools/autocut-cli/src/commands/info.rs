//! Show job information.

use std::path::PathBuf;

use autocut_plan_model::AssetMap;

use super::load_job;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let job = load_job(&path)?;
    let m = &job.manifest;

    println!("Job: {}", m.name);
    println!("  Created: {}", m.created_at);
    println!("  Modified: {}", m.modified_at);
    println!("  Source: {}", m.source.as_deref().unwrap_or("(not set)"));
    println!("  Output: {}", job.output_path().display());
    println!();

    let style = &m.style;
    println!("Style:");
    match job.music_path() {
        Some(music) => println!(
            "  Music: {} (volume {}, fade {}s)",
            music.display(),
            style.music_volume,
            style.music_fade_secs
        ),
        None => println!("  Music: none"),
    }
    println!("  Crossfade: {}s", style.crossfade_secs);
    println!("  Visual filter: {}", style.visual_filter);
    if let Some(intro) = &style.intro_text {
        println!("  Intro card: \"{intro}\" ({}s)", style.title_card_secs);
    }
    if let Some(outro) = &style.outro_text {
        println!("  Outro card: \"{outro}\" ({}s)", style.title_card_secs);
    }
    println!(
        "  Subtitles: {} {}px, {} with {} stroke",
        style.subtitle.font, style.subtitle.font_size, style.subtitle.color, style.subtitle.stroke_color
    );
    println!();

    let plan = &job.plan;
    println!("Plan:");
    println!("  Segments: {}", plan.segments.len());
    for (i, segment) in plan.segments.iter().enumerate() {
        match segment.end {
            Some(end) => println!("    [{i}] {:.2}s - {:.2}s", segment.start, end),
            None => println!("    [{i}] {:.2}s - end", segment.start),
        }
    }
    println!("  Captions: {}", plan.captions.len());

    let assets = AssetMap::discover(job.graphics_dir(), plan.graphics.len()).unwrap_or_default();
    println!("  Graphics: {} ({} generated)", plan.graphics.len(), assets.len());
    for (i, graphic) in plan.graphics.iter().enumerate() {
        let status = if assets.get(i).is_some() { "ready" } else { "missing" };
        println!(
            "    [{i}] at {:.2}s for {:.2}s, {status}: {}",
            graphic.timestamp,
            graphic.duration,
            graphic.prompt.as_deref().unwrap_or("(no prompt)")
        );
    }

    if !plan.transitions.is_empty() {
        println!("  Transition hints (advisory):");
        for hint in &plan.transitions {
            println!("    {} at {:.2}s", hint.kind, hint.timestamp);
        }
    }

    if !plan.recoveries.is_empty() {
        println!();
        println!("Plan issues:");
        for recovery in &plan.recoveries {
            println!("  - {recovery}");
        }
    }

    Ok(())
}
