//! Painterly CLI - paint normal and color maps for UV-unwrapped meshes
//!
//! # Commands
//!
//! - `painterly init` - Write a default painterly.toml
//! - `painterly paint` - Run the pipeline on a JSON scene and write both maps
//!
//! # Usage
//!
//! ```bash
//! # Create a settings file next to the scene
//! painterly init
//!
//! # Paint with the settings file, overriding a couple of values
//! painterly paint scene.json --resolution 2048 --seed 7
//! ```
//!
//! # Settings (painterly.toml)
//!
//! ```toml
//! resolution = 1024
//! stroke_width = [8.0, 15.0]
//! stroke_length = [20.0, 40.0]
//! normal_angle_threshold = 10.0
//! mask = "region"
//! ```

mod init;
mod paint;
mod scene;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Painterly CLI - painterly map synthesis
#[derive(Parser)]
#[command(name = "painterly")]
#[command(about = "Generate painterly normal and color maps from UV layouts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a painterly.toml with the default settings
    Init(init::InitArgs),

    /// Paint the maps for a scene
    Paint(paint::PaintArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init::execute(args),
        Commands::Paint(args) => paint::execute(args),
    }
}
