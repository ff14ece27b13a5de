// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use postcam::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "postcam")]
#[command(about = "Capture and cover selection for short-form posts")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/postcam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a capture session against the synthetic camera
    Simulate {
        /// How long the shutter is held, in seconds
        #[arg(long, default_value = "3")]
        hold: f64,

        /// Tap the shutter instead (take a photo)
        #[arg(long, conflicts_with = "hold")]
        tap: bool,
    },

    /// Validate gallery files as a post selection
    Validate {
        /// Files to validate (MIME type guessed from the extension)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Validate as a single video instead of images
        #[arg(long)]
        video: bool,
    },

    /// Probe the true duration of a video
    Probe {
        file: PathBuf,
    },

    /// Extract the scrub thumbnail strip of a video
    Strip {
        file: PathBuf,

        /// Strip container width in pixels
        #[arg(short, long, default_value = "306")]
        width: u32,

        /// Output directory for the thumbnails
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract a full-size cover frame at a timestamp
    Cover {
        file: PathBuf,

        /// Timestamp in seconds (clamped to the video duration)
        #[arg(long, default_value = "0")]
        at: f64,

        /// Output JPEG path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=postcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        Commands::Simulate { hold, tap } => cli::simulate(&config, hold, tap),
        Commands::Validate { files, video } => cli::validate(&config, &files, video),
        Commands::Probe { file } => cli::probe(&config, &file),
        Commands::Strip {
            file,
            width,
            output,
        } => cli::strip(&config, &file, width, &output),
        Commands::Cover { file, at, output } => cli::cover(&config, &file, at, &output),
    }
}
