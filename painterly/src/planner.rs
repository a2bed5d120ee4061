//! Stroke placement
//!
//! Each region gets two passes of strokes:
//!
//! - **Coverage**: a grid sized from the average stroke dimensions is laid
//!   over the region's bounding box, and every cell that touches the region
//!   gets one stroke anchored on a region pixel. Cells are smaller than a
//!   stroke, so neighbouring strokes overlap and the region fills in.
//! - **Accent**: a handful of shorter strokes at random region pixels, mostly
//!   following the surface direction, to break up the grid.
//!
//! Placement only picks anchors, directions and sizes. Colors are resolved by
//! the caller and masking is left to the compositor.

use std::f32::consts::{FRAC_PI_3, FRAC_PI_4, TAU};

use glam::{UVec2, Vec2, Vec3};
use hashbrown::HashMap;
use rand::Rng;

use crate::config::{MaskMode, PainterlyConfig};
use crate::raster::{PixelGrid, PixelRecord};

/// Grid cell size as a fraction of the smaller average stroke dimension
pub const GRID_FACTOR: f32 = 0.6;

/// Grid cells never get smaller than this
pub const MIN_GRID_CELL: u32 = 5;

/// Probability that an accent stroke follows the surface direction
pub const ACCENT_ALIGN_PROBABILITY: f64 = 0.7;

const PARALLEL_EPSILON: f32 = 1e-3;

/// Ownership a stroke is masked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskTarget {
    Region(u32),
    Object(u32),
}

impl MaskTarget {
    #[inline]
    pub fn matches(&self, record: &PixelRecord) -> bool {
        match *self {
            MaskTarget::Region(id) => record.region == Some(id),
            MaskTarget::Object(id) => record.owner == Some(id),
        }
    }
}

/// Which pass produced a stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokePass {
    Coverage,
    Accent,
}

/// A stroke placement before colors are known
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedStroke {
    /// Center pixel of the stroke
    pub anchor: UVec2,
    /// Direction in radians, counter-clockwise from +U
    pub angle: f32,
    /// Width at the thickest point, in pixels
    pub width: f32,
    /// End-to-end length in pixels
    pub length: f32,
    /// Blend opacity
    pub opacity: f32,
    /// Per-channel color jitter magnitude
    pub jitter: f32,
    pub target: MaskTarget,
    pub pass: StrokePass,
}

impl PlannedStroke {
    /// Unit direction vector
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }
}

/// The pixels of one region and their bounding box.
///
/// Membership is answered by the [`PixelGrid`] itself, so no per-region
/// bitmap is kept.
#[derive(Debug, Clone)]
pub struct RegionPixels {
    pub object: u32,
    pub region: u32,
    pixels: Vec<UVec2>,
    min: UVec2,
    max: UVec2,
}

impl RegionPixels {
    fn new(object: u32, region: u32, pixels: Vec<UVec2>) -> Self {
        let min = pixels.iter().copied().fold(UVec2::MAX, UVec2::min);
        let max = pixels.iter().copied().fold(UVec2::ZERO, UVec2::max);
        Self {
            object,
            region,
            pixels,
            min,
            max,
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[UVec2] {
        &self.pixels
    }

    /// Inclusive bounding box (min, max)
    pub fn bounds(&self) -> (UVec2, UVec2) {
        (self.min, self.max)
    }

    /// Whether pixel `p` belongs to this region
    pub fn contains(&self, grid: &PixelGrid, p: UVec2) -> bool {
        if p.x < self.min.x || p.y < self.min.y || p.x > self.max.x || p.y > self.max.y {
            return false;
        }
        let record = grid.get(p.x, p.y);
        record.owner == Some(self.object) && record.region == Some(self.region)
    }

    /// Representative pixel of the grid cell starting at `origin`.
    ///
    /// Prefers the cell center; otherwise the first region pixel found
    /// scanning the cell row by row.
    pub fn cell_anchor(&self, grid: &PixelGrid, origin: UVec2, cell: u32) -> Option<UVec2> {
        let center = origin + UVec2::splat(cell / 2);
        if self.contains(grid, center) {
            return Some(center);
        }

        let end = (origin + UVec2::splat(cell)).min(UVec2::splat(grid.resolution()));
        (origin.y..end.y)
            .flat_map(|y| (origin.x..end.x).map(move |x| UVec2::new(x, y)))
            .find(|&p| self.contains(grid, p))
    }
}

/// Gather the regions of `object` from the grid, ordered by region id
pub fn collect_regions(grid: &PixelGrid, object: u32) -> Vec<RegionPixels> {
    let mut by_region: HashMap<u32, Vec<UVec2>> = HashMap::new();
    for (x, y, record) in grid.iter() {
        if record.owner != Some(object) {
            continue;
        }
        if let Some(region) = record.region {
            by_region.entry(region).or_default().push(UVec2::new(x, y));
        }
    }

    let mut regions: Vec<_> = by_region
        .into_iter()
        .map(|(region, pixels)| RegionPixels::new(object, region, pixels))
        .collect();
    regions.sort_unstable_by_key(|r| r.region);
    regions
}

/// Stroke direction following the surface: the tangent `normal x up`,
/// or +U when the normal points straight up or down
pub fn tangent_angle(normal: Vec3) -> f32 {
    let tangent = normal.normalize_or_zero().cross(Vec3::Z);
    if tangent.length() < PARALLEL_EPSILON {
        return 0.0;
    }
    let tangent = tangent.normalize();
    tangent.y.atan2(tangent.x)
}

/// Plans coverage and accent strokes for regions
#[derive(Debug, Clone, Copy)]
pub struct StrokePlanner<'a> {
    config: &'a PainterlyConfig,
}

impl<'a> StrokePlanner<'a> {
    pub fn new(config: &'a PainterlyConfig) -> Self {
        Self { config }
    }

    /// Side of the coverage grid cells in pixels
    pub fn grid_cell_size(&self) -> u32 {
        let smaller = self.config.average_width().min(self.config.average_length());
        ((smaller * GRID_FACTOR).floor() as u32).max(MIN_GRID_CELL)
    }

    fn target(&self, region: &RegionPixels) -> MaskTarget {
        match self.config.mask {
            MaskMode::Region => MaskTarget::Region(region.region),
            MaskMode::Object => MaskTarget::Object(region.object),
        }
    }

    fn sample_range<R: Rng + ?Sized>(rng: &mut R, [min, max]: [f32; 2]) -> f32 {
        if max > min { rng.random_range(min..=max) } else { min }
    }

    /// One stroke per grid cell that touches the region
    pub fn plan_coverage<R: Rng + ?Sized>(
        &self,
        region: &RegionPixels,
        grid: &PixelGrid,
        rng: &mut R,
    ) -> Vec<PlannedStroke> {
        let cell = self.grid_cell_size();
        let (min, max) = region.bounds();
        let target = self.target(region);
        let mut strokes = Vec::new();

        for gy in (min.y..=max.y).step_by(cell as usize) {
            for gx in (min.x..=max.x).step_by(cell as usize) {
                let Some(anchor) = region.cell_anchor(grid, UVec2::new(gx, gy), cell) else {
                    continue;
                };

                let normal = grid.get(anchor.x, anchor.y).normal;
                let angle = tangent_angle(normal) + rng.random_range(-FRAC_PI_4..=FRAC_PI_4);

                strokes.push(PlannedStroke {
                    anchor,
                    angle,
                    width: Self::sample_range(rng, self.config.stroke_width),
                    length: Self::sample_range(rng, self.config.stroke_length),
                    opacity: self.config.coverage_opacity,
                    jitter: self.config.color_variation,
                    target,
                    pass: StrokePass::Coverage,
                });
            }
        }

        strokes
    }

    /// Shorter strokes at random region pixels, one per `accent_divisor` pixels
    pub fn plan_accents<R: Rng + ?Sized>(
        &self,
        region: &RegionPixels,
        grid: &PixelGrid,
        rng: &mut R,
    ) -> Vec<PlannedStroke> {
        let count = region.len() / self.config.accent_divisor.max(1);
        let target = self.target(region);
        let [min_len, max_len] = self.config.stroke_length;
        let length_range = [min_len / 2.0, max_len / 2.0];

        (0..count)
            .map(|_| {
                let anchor = region.pixels()[rng.random_range(0..region.len())];
                let angle = if rng.random_bool(ACCENT_ALIGN_PROBABILITY) {
                    let normal = grid.get(anchor.x, anchor.y).normal;
                    tangent_angle(normal) + rng.random_range(-FRAC_PI_3..=FRAC_PI_3)
                } else {
                    rng.random_range(0.0..TAU)
                };

                PlannedStroke {
                    anchor,
                    angle,
                    width: Self::sample_range(rng, self.config.stroke_width),
                    length: Self::sample_range(rng, length_range),
                    opacity: self.config.accent_opacity,
                    jitter: self.config.color_variation * 2.0,
                    target,
                    pass: StrokePass::Accent,
                }
            })
            .collect()
    }

    /// Both passes for one region; small regions get nothing
    pub fn plan_region<R: Rng + ?Sized>(
        &self,
        region: &RegionPixels,
        grid: &PixelGrid,
        rng: &mut R,
    ) -> Vec<PlannedStroke> {
        if region.len() < self.config.min_region_pixels || region.is_empty() {
            return Vec::new();
        }

        let mut strokes = self.plan_coverage(region, grid, rng);
        strokes.extend(self.plan_accents(region, grid, rng));
        strokes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    /// Grid with one object whose region 0 covers `pixels`
    fn grid_with(resolution: u32, pixels: impl Iterator<Item = (u32, u32)>) -> PixelGrid {
        let mut grid = PixelGrid::new(resolution);
        for (x, y) in pixels {
            let rec = grid.get_mut(x, y);
            rec.owner = Some(0);
            rec.region = Some(0);
            rec.face = Some(0);
            rec.normal = Vec3::Y;
        }
        grid
    }

    fn full_square(resolution: u32) -> impl Iterator<Item = (u32, u32)> {
        (0..resolution).flat_map(move |y| (0..resolution).map(move |x| (x, y)))
    }

    #[test]
    fn test_grid_cell_size() {
        let config = PainterlyConfig::default();
        // min(11.5, 30) * 0.6 = 6.9
        assert_eq!(StrokePlanner::new(&config).grid_cell_size(), 6);

        let tiny = PainterlyConfig {
            stroke_width: [1.0, 2.0],
            ..Default::default()
        };
        assert_eq!(StrokePlanner::new(&tiny).grid_cell_size(), MIN_GRID_CELL);
    }

    #[test]
    fn test_tangent_angle() {
        assert_eq!(tangent_angle(Vec3::Z), 0.0);
        assert_eq!(tangent_angle(Vec3::NEG_Z), 0.0);
        // Y x Z = X
        assert!(tangent_angle(Vec3::Y).abs() < 1e-6);
        // X x Z = -Y
        let a = tangent_angle(Vec3::X);
        assert!((a + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_collect_regions_splits_by_id() {
        let mut grid = grid_with(8, full_square(8));
        for y in 0..8 {
            for x in 4..8 {
                grid.get_mut(x, y).region = Some(5);
            }
        }
        grid.get_mut(0, 0).owner = Some(1);

        let regions = collect_regions(&grid, 0);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].region, 0);
        assert_eq!(regions[0].len(), 31);
        assert_eq!(regions[1].region, 5);
        assert_eq!(regions[1].bounds(), (UVec2::new(4, 0), UVec2::new(7, 7)));
        assert!(!regions[0].contains(&grid, UVec2::new(0, 0)));
        assert!(regions[0].contains(&grid, UVec2::new(1, 0)));
        assert!(!regions[1].contains(&grid, UVec2::new(1, 0)));
    }

    #[test]
    fn test_interleaved_regions_share_the_atlas() {
        // Stripes: every region's bounding box spans the whole grid
        let res = 32;
        let mut grid = grid_with(res, full_square(res));
        for y in 0..res {
            for x in 0..res {
                grid.get_mut(x, y).region = Some(y % 4);
            }
        }

        let regions = collect_regions(&grid, 0);
        assert_eq!(regions.len(), 4);
        for region in &regions {
            assert_eq!(region.len(), (res * res / 4) as usize);
            assert_eq!(region.bounds().0.x, 0);
            assert_eq!(region.bounds().1.x, res - 1);
            for y in 0..res {
                let p = UVec2::new(7, y);
                assert_eq!(region.contains(&grid, p), y % 4 == region.region);
            }
        }

        // Membership follows later ownership changes in the grid
        grid.get_mut(7, 0).owner = Some(9);
        assert!(!regions[0].contains(&grid, UVec2::new(7, 0)));
    }

    #[test]
    fn test_cell_anchor_prefers_center() {
        let grid = grid_with(16, full_square(16));
        let region = &collect_regions(&grid, 0)[0];
        assert_eq!(region.cell_anchor(&grid, UVec2::ZERO, 6), Some(UVec2::new(3, 3)));
    }

    #[test]
    fn test_cell_anchor_scans_when_center_missing() {
        // Only the bottom-right corner of the cell belongs to the region
        let grid = grid_with(16, [(5, 4), (4, 5)].into_iter());
        let region = &collect_regions(&grid, 0)[0];
        assert_eq!(region.cell_anchor(&grid, UVec2::ZERO, 6), Some(UVec2::new(5, 4)));
        assert_eq!(region.cell_anchor(&grid, UVec2::new(6, 6), 6), None);
    }

    #[test]
    fn test_coverage_anchors_every_touched_cell() {
        let res = 64;
        // An L-shaped region
        let pixels = full_square(res).filter(|&(x, y)| x < 20 || y < 20);
        let grid = grid_with(res, pixels);
        let region = &collect_regions(&grid, 0)[0];
        let config = PainterlyConfig::default();
        let planner = StrokePlanner::new(&config);
        let cell = planner.grid_cell_size();
        let mut rng = Pcg64::seed_from_u64(1);

        let strokes = planner.plan_coverage(region, &grid, &mut rng);
        let (min, max) = region.bounds();

        for gy in (min.y..=max.y).step_by(cell as usize) {
            for gx in (min.x..=max.x).step_by(cell as usize) {
                let touched = (gy..(gy + cell).min(res))
                    .any(|y| (gx..(gx + cell).min(res)).any(|x| region.contains(&grid, UVec2::new(x, y))));
                let anchored = strokes.iter().any(|s| {
                    s.anchor.x >= gx && s.anchor.x < gx + cell && s.anchor.y >= gy && s.anchor.y < gy + cell
                });
                assert_eq!(touched, anchored, "cell at ({gx}, {gy})");
            }
        }
    }

    #[test]
    fn test_anchors_stay_in_region() {
        let res = 48;
        let pixels = full_square(res).filter(|&(x, y)| (x as i32 - 24).pow(2) + (y as i32 - 24).pow(2) < 400);
        let grid = grid_with(res, pixels);
        let region = &collect_regions(&grid, 0)[0];
        let config = PainterlyConfig {
            accent_divisor: 50,
            ..Default::default()
        };
        let planner = StrokePlanner::new(&config);
        let mut rng = Pcg64::seed_from_u64(99);

        let strokes = planner.plan_region(region, &grid, &mut rng);
        assert!(strokes.iter().any(|s| s.pass == StrokePass::Accent));
        for stroke in &strokes {
            assert!(region.contains(&grid, stroke.anchor));
            assert_eq!(stroke.target, MaskTarget::Region(0));
            assert!((8.0..=15.0).contains(&stroke.width));
            match stroke.pass {
                StrokePass::Coverage => {
                    assert!((20.0..=40.0).contains(&stroke.length));
                    assert_eq!(stroke.opacity, 0.8);
                }
                StrokePass::Accent => {
                    assert!((10.0..=20.0).contains(&stroke.length));
                    assert_eq!(stroke.opacity, 0.7);
                }
            }
        }
    }

    #[test]
    fn test_accent_count() {
        let grid = grid_with(64, full_square(64));
        let region = &collect_regions(&grid, 0)[0];
        let config = PainterlyConfig::default();
        let mut rng = Pcg64::seed_from_u64(3);
        let accents = StrokePlanner::new(&config).plan_accents(region, &grid, &mut rng);
        assert_eq!(accents.len(), 4096 / 800);
    }

    #[test]
    fn test_small_regions_skipped() {
        let grid = grid_with(16, (0..9).map(|x| (x, 0)));
        let region = &collect_regions(&grid, 0)[0];
        let config = PainterlyConfig::default();
        let mut rng = Pcg64::seed_from_u64(5);
        assert!(StrokePlanner::new(&config).plan_region(region, &grid, &mut rng).is_empty());
    }

    #[test]
    fn test_object_mask_mode() {
        let grid = grid_with(16, full_square(16));
        let region = &collect_regions(&grid, 0)[0];
        let config = PainterlyConfig {
            mask: MaskMode::Object,
            ..Default::default()
        };
        let mut rng = Pcg64::seed_from_u64(5);
        let strokes = StrokePlanner::new(&config).plan_coverage(region, &grid, &mut rng);
        assert!(strokes.iter().all(|s| s.target == MaskTarget::Object(0)));
    }
}
