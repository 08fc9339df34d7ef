//! Check for required external tools.

use autocut_common::AppConfig;
use autocut_render_engine::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("autocut System Check");
    println!("{}", "=".repeat(50));

    let tools = [
        ("ffmpeg", "rendering"),
        ("ffprobe", "media probing"),
    ];

    let mut all_ok = true;
    for (binary, purpose) in tools {
        if command_exists(binary) {
            println!("[OK] {binary} ({purpose})");
        } else {
            println!("[MISSING] {binary} ({purpose}): install ffmpeg and make sure it is on PATH");
            all_ok = false;
        }
    }

    match &config.generation.command {
        Some(command) => println!("[OK] Graphic generation command: {command}"),
        None => println!("[WARN] No graphic generation command configured (graphics must be supplied in graphics/)"),
    }

    println!();
    if all_ok {
        println!("All required tools are available. autocut is ready.");
    } else {
        println!("Some required tools are missing. See above for fixes.");
    }

    Ok(())
}
