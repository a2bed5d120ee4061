//! Sequential batch pipeline
//!
//! Phases run to completion one after another: rasterize every object, then
//! segment every object, then plan and composite strokes region by region.
//! A failing object is recorded in the [`RunReport`] and skipped; its
//! siblings are still processed.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::buffer::PainterlyMaps;
use crate::compositor::{Compositor, Stroke};
use crate::config::PainterlyConfig;
use crate::error::{PainterlyError, Result};
use crate::mesh::MeshObject;
use crate::planner::{StrokePass, StrokePlanner, collect_regions};
use crate::raster::{PixelGrid, Rasterizer};
use crate::region::Segmenter;
use crate::sampler::{ColorSource, TextureCache};

/// A recoverable problem tied to one object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectIssue {
    pub object: String,
    pub error: PainterlyError,
}

/// Summary of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Objects that were painted
    pub objects_painted: usize,
    /// Regions produced by segmentation across all objects
    pub regions: usize,
    /// Regions that received strokes
    pub regions_painted: usize,
    pub coverage_strokes: usize,
    pub accent_strokes: usize,
    /// Pixels whose ownership moved from one object to a later one
    pub overlapping_pixels: usize,
    /// Objects that were skipped, with the reason
    pub issues: Vec<ObjectIssue>,
    /// Seed the run used
    pub seed: u64,
    pub elapsed: Duration,
}

impl RunReport {
    /// Names of objects that were skipped entirely
    pub fn skipped_objects(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|issue| issue.object.as_str())
    }
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PainterlyOutput {
    pub maps: PainterlyMaps,
    /// Final ownership records, useful for previews and debugging
    pub grid: PixelGrid,
    pub report: RunReport,
}

/// Run the pipeline with the configured seed, or a random one
pub fn run(objects: &[MeshObject], config: &PainterlyConfig) -> Result<PainterlyOutput> {
    let seed = config.seed.unwrap_or_else(rand::random);
    run_seeded(objects, config, seed)
}

/// Run the pipeline with an explicit seed
pub fn run_seeded(
    objects: &[MeshObject],
    config: &PainterlyConfig,
    seed: u64,
) -> Result<PainterlyOutput> {
    let start = Instant::now();

    if objects.is_empty() {
        return Err(PainterlyError::NoObjects);
    }
    let config = config.clone().normalized()?;

    tracing::info!(
        objects = objects.len(),
        resolution = config.resolution,
        seed,
        "Starting painterly texture generation"
    );

    let mut rng = Pcg64::seed_from_u64(seed);
    let mut report = RunReport {
        seed,
        ..Default::default()
    };

    let mut maps = PainterlyMaps::new(config.resolution);
    let mut grid = PixelGrid::new(config.resolution);

    // Objects whose own image fails to cache are skipped like any other
    // per-object failure
    let (texture, texture_failures) = TextureCache::resolve_shared(objects);
    let mut failed_texture: Vec<Option<PainterlyError>> = vec![None; objects.len()];
    for (index, error) in texture_failures {
        failed_texture[index] = Some(error);
    }

    // Global face ids: each object's faces start after the previous object's
    let face_offsets: Vec<usize> = objects
        .iter()
        .scan(0, |offset, object| {
            let start = *offset;
            *offset += object.faces.len();
            Some(start)
        })
        .collect();

    // Phase 1: rasterize
    let rasterizer = Rasterizer::new(config.resolution);
    let mut active = vec![false; objects.len()];
    for (index, object) in objects.iter().enumerate() {
        let checked = match failed_texture[index].take() {
            Some(error) => Err(error),
            None => object.check().map(|_| ()),
        };
        if let Err(error) = checked {
            tracing::warn!(object = %object.name, "Skipping object: {}", error);
            report.issues.push(ObjectIssue {
                object: object.name.clone(),
                error,
            });
            continue;
        }

        let stats = rasterizer.rasterize_object(&mut grid, index as u32, object, face_offsets[index]);
        tracing::info!(
            object = %object.name,
            triangles = stats.triangles,
            pixels = stats.pixels_written,
            "Rasterized object {}/{}",
            index + 1,
            objects.len()
        );
        report.overlapping_pixels += stats.overwritten_foreign;
        active[index] = true;
    }

    if report.overlapping_pixels > 0 {
        tracing::warn!(
            pixels = report.overlapping_pixels,
            "UV footprints of different objects overlap; later objects own the shared pixels"
        );
    }

    // Phase 2: segment
    let segmenter = Segmenter::new(config.normal_angle_threshold);
    let mut region_offset = 0u32;
    for (index, object) in objects.iter().enumerate() {
        if !active[index] {
            continue;
        }
        match segmenter.segment(object, face_offsets[index], region_offset) {
            Ok(segmentation) => {
                grid.assign_regions(&segmentation);
                region_offset = segmentation.next_region_offset();
                report.regions += segmentation.region_count();
                tracing::info!(
                    object = %object.name,
                    regions = segmentation.region_count(),
                    "Segmented object"
                );
            }
            Err(error) => {
                tracing::warn!(object = %object.name, "Skipping object: {}", error);
                report.issues.push(ObjectIssue {
                    object: object.name.clone(),
                    error,
                });
                active[index] = false;
            }
        }
    }

    // Phase 3: plan and composite
    let planner = StrokePlanner::new(&config);
    let compositor = Compositor::new(&grid);
    for (index, object) in objects.iter().enumerate() {
        if !active[index] {
            continue;
        }

        let source = match &texture {
            Some(cache) => ColorSource::Texture(cache),
            None => ColorSource::Flat(object.material.base_color),
        };

        let regions = collect_regions(&grid, index as u32);
        if regions.is_empty() {
            tracing::info!(object = %object.name, "No pixels found for object");
            continue;
        }

        for region in &regions {
            let plans = planner.plan_region(region, &grid, &mut rng);
            if plans.is_empty() {
                continue;
            }
            tracing::debug!(
                region = region.region,
                pixels = region.len(),
                strokes = plans.len(),
                "Painting region"
            );

            for plan in plans {
                let record = grid.get(plan.anchor.x, plan.anchor.y);
                let stroke = Stroke::shade(plan, source.color_at(record.uv), record.normal, &mut rng);
                compositor.composite(&mut maps, &stroke);

                match plan.pass {
                    StrokePass::Coverage => report.coverage_strokes += 1,
                    StrokePass::Accent => report.accent_strokes += 1,
                }
            }
            report.regions_painted += 1;
        }

        report.objects_painted += 1;
    }

    report.elapsed = start.elapsed();
    tracing::info!(
        coverage = report.coverage_strokes,
        accents = report.accent_strokes,
        "Painterly maps generated in {:.2} seconds",
        report.elapsed.as_secs_f32()
    );

    Ok(PainterlyOutput { maps, grid, report })
}
