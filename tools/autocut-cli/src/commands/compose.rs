//! Compose a job's render graph without rendering it.

use std::path::PathBuf;

use autocut_composer::UnitContent;

use super::{compose_job, load_job, print_recoveries};

pub fn run(path: PathBuf, json: bool, output: Option<PathBuf>) -> anyhow::Result<()> {
    let job = load_job(&path)?;
    let graph = compose_job(&job, &job.manifest.style)?;

    if json || output.is_some() {
        let rendered = serde_json::to_string_pretty(&graph)?;
        match output {
            Some(out) => {
                std::fs::write(&out, rendered)?;
                println!("Render graph written to {}", out.display());
            }
            None => println!("{rendered}"),
        }
        return Ok(());
    }

    println!("Render graph for '{}':", job.manifest.name);
    println!("  Frame: {}x{}", graph.width, graph.height);
    println!("  Duration: {:.2}s", graph.duration);
    println!("  Crossfade: {:.2}s", graph.crossfade);
    println!("  Audio: {}", graph.audio.label());
    println!("  Visual filter: {}", graph.visual_filter);
    println!();

    for unit in &graph.units {
        let start = unit.output_start;
        let end = start + unit.output_duration;
        match &unit.content {
            UnitContent::TitleCard(card) => {
                println!("  {start:>8.2}s - {end:>8.2}s  {:?} card: \"{}\"", card.role, card.text);
            }
            UnitContent::Segment(segment) => {
                println!(
                    "  {start:>8.2}s - {end:>8.2}s  segment {} from source {:.2}s - {:.2}s, {} overlay(s)",
                    segment.index,
                    segment.source.start,
                    segment.source.end,
                    segment.overlays.len()
                );
            }
        }
    }

    println!();
    print_recoveries(&graph);
    Ok(())
}
