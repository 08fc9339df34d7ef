//! autocut CLI: create, inspect, compose and render editing jobs.
//!
//! Usage:
//!   autocut init <NAME>          Create a job bundle
//!   autocut validate <PATH>      Validate a job bundle
//!   autocut info <PATH>          Show job and plan information
//!   autocut generate <PATH>      Generate the plan's graphics
//!   autocut compose <PATH>       Compose and print the render graph
//!   autocut render <PATH>        Render the job to video
//!   autocut subtitles <PATH>     Write caption sidecars
//!   autocut check                Check for ffmpeg and ffprobe

use std::path::PathBuf;

use autocut_plan_model::VisualFilter;
use autocut_render_engine::SubtitleFormat;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "autocut",
    about = "Turn a raw talk or tutorial recording into an edited cut",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new job bundle
    Init {
        /// Job name
        name: String,

        /// Parent directory (defaults to the configured jobs directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source video to edit
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Validate a job bundle
    Validate {
        /// Path to the job directory
        path: PathBuf,
    },

    /// Show job information
    Info {
        /// Path to the job directory
        path: PathBuf,
    },

    /// Generate the plan's graphics with the configured command
    Generate {
        /// Path to the job directory
        path: PathBuf,

        /// Generation command (overrides the configured one)
        #[arg(long)]
        command: Option<String>,

        /// Maximum concurrent generations
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Compose the render graph without rendering
    Compose {
        /// Path to the job directory
        path: PathBuf,

        /// Print the full graph as JSON
        #[arg(long)]
        json: bool,

        /// Write the JSON graph to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a job to video
    Render {
        /// Path to the job directory
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Crossfade between segments (seconds)
        #[arg(long)]
        crossfade: Option<f64>,

        /// Visual filter: none|monochrome|invert_colors|mirror|rotate90|rotate180
        #[arg(long)]
        filter: Option<VisualFilter>,

        /// Background music file
        #[arg(long)]
        music: Option<PathBuf>,

        /// Music volume (linear gain)
        #[arg(long)]
        music_volume: Option<f64>,

        /// Intro title card text
        #[arg(long)]
        intro: Option<String>,

        /// Outro title card text
        #[arg(long)]
        outro: Option<String>,

        /// Also write a caption sidecar: srt|vtt
        #[arg(long)]
        subtitles: Option<SubtitleFormat>,
    },

    /// Write captions on the output timeline as SRT or VTT
    Subtitles {
        /// Path to the job directory
        path: PathBuf,

        /// Subtitle format: srt|vtt
        #[arg(long, default_value = "srt")]
        format: SubtitleFormat,

        /// Output file (defaults next to the job's render target)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check for required external tools
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = autocut_common::AppConfig::load();
    autocut_common::logging::init_cli_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Init {
            name,
            output,
            source,
        } => commands::init::run(name, output.unwrap_or_else(|| config.jobs_dir.clone()), source),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
        Commands::Generate {
            path,
            command,
            concurrency,
        } => commands::generate::run(path, command, concurrency, &config).await,
        Commands::Compose { path, json, output } => commands::compose::run(path, json, output),
        Commands::Render {
            path,
            output,
            crossfade,
            filter,
            music,
            music_volume,
            intro,
            outro,
            subtitles,
        } => {
            let overrides = commands::render::StyleOverrides {
                crossfade,
                filter,
                music,
                music_volume,
                intro,
                outro,
            };
            commands::render::run(path, output, overrides, subtitles, &config).await
        }
        Commands::Subtitles {
            path,
            format,
            output,
        } => commands::subtitles::run(path, format, output),
        Commands::Check => commands::check::run(&config),
    }
}
