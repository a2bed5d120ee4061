//! Paint command - run the pipeline on a scene and write both maps

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::scene::SceneFile;
use crate::settings::{Overrides, Settings};

/// Arguments for the paint command
#[derive(Args)]
pub struct PaintArgs {
    /// Scene JSON file
    pub scene: PathBuf,

    /// Settings file (defaults to painterly.toml next to the scene, if present)
    #[arg(short = 'c', long = "config")]
    pub settings: Option<PathBuf>,

    /// Output directory for the maps (defaults to the scene's directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Execute the paint command
pub fn execute(args: PaintArgs) -> Result<()> {
    let scene_dir = args
        .scene
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let config = Settings::resolve(args.settings.as_deref(), &scene_dir.join("painterly.toml"))?;
    let config = args.overrides.apply(config);

    let objects = SceneFile::load(&args.scene)?.into_objects(&scene_dir);
    println!("Painting {} object(s) at {}px...", objects.len(), config.resolution);

    let output = painterly::run(&objects, &config)
        .with_context(|| format!("Failed to paint {}", args.scene.display()))?;

    let out_dir = args.output.unwrap_or(scene_dir);
    let (normal_path, color_path) = painterly::export::write_maps(&output.maps, &out_dir)
        .with_context(|| format!("Failed to write maps to {}", out_dir.display()))?;

    let report = &output.report;
    for issue in &report.issues {
        println!("  Warning: {}: {}", issue.object, issue.error);
    }
    println!(
        "  {} object(s), {} region(s), {} coverage + {} accent strokes",
        report.objects_painted, report.regions, report.coverage_strokes, report.accent_strokes
    );
    println!("  Seed: {}", report.seed);
    println!("  Normal map: {}", normal_path.display());
    println!("  Color map: {}", color_path.display());
    println!("Done in {:.2}s", report.elapsed.as_secs_f32());

    Ok(())
}
