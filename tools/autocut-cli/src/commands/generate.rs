//! Generate the plan's graphics into the job's graphics directory.

use std::path::PathBuf;
use std::sync::Arc;

use autocut_assets::{generate_graphics, CommandGenerator, RetryPolicy};
use autocut_common::AppConfig;

use super::load_job;

pub async fn run(
    path: PathBuf,
    command: Option<String>,
    concurrency: Option<usize>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let job = load_job(&path)?;

    let command = command
        .or_else(|| config.generation.command.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No generation command configured. Pass --command or set generation.command in the config file."
            )
        })?;

    let requests = job.plan.graphic_requests();
    if requests.is_empty() {
        println!("Plan has no graphic prompts; nothing to generate.");
        return Ok(());
    }

    let concurrency = concurrency.unwrap_or(config.generation.max_concurrency);
    let policy = RetryPolicy::from(&config.generation);
    println!(
        "Generating {} graphic(s) with up to {} worker(s)...",
        requests.len(),
        concurrency
    );

    let generator = Arc::new(CommandGenerator::new(command, job.graphics_dir()));
    let assets = generate_graphics(generator, &requests, &policy, concurrency).await;

    for (index, _) in &requests {
        match assets.get(*index) {
            Some(file) => println!("  [{index}] {}", file.display()),
            None => println!("  [{index}] failed (will be skipped when composing)"),
        }
    }
    println!(
        "\n{} of {} graphic(s) ready in {}",
        assets.len(),
        requests.len(),
        job.graphics_dir().display()
    );

    Ok(())
}
