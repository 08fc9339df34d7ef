//! Initialize a new job bundle.

use std::path::PathBuf;

use autocut_plan_model::LoadedJob;

pub fn run(name: String, output: PathBuf, source: Option<PathBuf>) -> anyhow::Result<()> {
    let job_dir = output.join(&name);
    println!("Creating job '{}' at {}", name, job_dir.display());

    let mut job = LoadedJob::create(&job_dir, &name)
        .map_err(|e| anyhow::anyhow!("Failed to create job: {e}"))?;

    if let Some(source) = source {
        let source = std::fs::canonicalize(&source).unwrap_or(source);
        job.manifest.source = Some(source.display().to_string());
        job.save()
            .map_err(|e| anyhow::anyhow!("Failed to save job: {e}"))?;
    }

    println!("Job created successfully:");
    println!("  Directory: {}", job.root.display());
    match &job.manifest.source {
        Some(source) => println!("  Source: {source}"),
        None => println!("  Source: (not set; edit job.json)"),
    }
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── job.json     (source, output, style)");
    println!("  ├── plan.json    (editing plan or raw model reply)");
    println!("  ├── graphics/    (overlay images, graphic_<index>_*.png)");
    println!("  └── exports/     (rendered output)");

    Ok(())
}
