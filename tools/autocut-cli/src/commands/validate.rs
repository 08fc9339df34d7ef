//! Validate an autocut job bundle.

use std::path::PathBuf;

use super::load_job;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating job at: {}", path.display());

    let job = load_job(&path)?;

    println!("  Name: {}", job.manifest.name);
    println!("  Version: {}", job.manifest.version);
    println!(
        "  Plan: {} segments, {} captions, {} graphics, {} transition hints",
        job.plan.segments.len(),
        job.plan.captions.len(),
        job.plan.graphics.len(),
        job.plan.transitions.len()
    );

    let mut issues = job.validate_sources();
    issues.extend(
        job.plan
            .recoveries
            .iter()
            .map(|r| format!("Plan: {r}")),
    );

    if issues.is_empty() {
        println!("  Sources: All present");
        println!("\nJob is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Malformed plan fields fall back to defaults when composing.",
            issues.len()
        );
    }

    Ok(())
}
