//! Write the job's captions, on the output timeline, as a sidecar file.

use std::path::PathBuf;

use autocut_render_engine::subtitles::generate;
use autocut_render_engine::SubtitleFormat;

use super::{compose_job, load_job};

pub fn run(path: PathBuf, format: SubtitleFormat, output: Option<PathBuf>) -> anyhow::Result<()> {
    let job = load_job(&path)?;
    let graph = compose_job(&job, &job.manifest.style)?;
    let captions = graph.timed_captions();

    let output_path =
        output.unwrap_or_else(|| job.output_path().with_extension(format.extension()));
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_path, generate(&captions, format))?;

    println!(
        "Wrote {} caption(s) to {}",
        captions.len(),
        output_path.display()
    );
    Ok(())
}
