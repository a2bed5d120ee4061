//! Stroke compositing
//!
//! A stroke is traced as an integer line through its anchor. Every traced
//! pixel that belongs to the stroke's target stamps a square brush whose size
//! follows a parabolic taper, thick in the middle and thin at both ends. Brush
//! pixels are blended only where the stored ownership matches the target, so
//! paint never crosses into another region or object, even where the nominal
//! stroke path passes over it.

use glam::{IVec2, Vec3};
use rand::Rng;

use crate::buffer::{MapBuffer, PainterlyMaps, pack_normal};
use crate::planner::PlannedStroke;
use crate::raster::PixelGrid;
use crate::sampler::jitter;

/// A planned stroke with its resolved colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub plan: PlannedStroke,
    /// Color map paint: sampled base color plus jitter
    pub color: [f32; 4],
    /// Normal map paint: packed anchor normal
    pub normal_color: [f32; 4],
}

impl Stroke {
    /// Resolve colors for `plan` from the sampled base color and the anchor's normal
    pub fn shade<R: Rng + ?Sized>(
        plan: PlannedStroke,
        base: [f32; 3],
        normal: Vec3,
        rng: &mut R,
    ) -> Self {
        Self {
            plan,
            color: jitter(base, plan.jitter, rng),
            normal_color: pack_normal(normal),
        }
    }
}

/// Brush thickness at fraction `t` along the stroke, at least one pixel
pub fn taper(width: f32, t: f32) -> u32 {
    let profile = 1.0 - 0.5 * (2.0 * t - 1.0).powi(2);
    ((width * profile).floor() as u32).max(1)
}

/// Bresenham line from `from` to `to`, both endpoints included
pub fn trace_line(from: IVec2, to: IVec2) -> Vec<IVec2> {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx - dy;

    let mut points = Vec::with_capacity(dx.max(dy) as usize + 1);
    let mut p = from;
    loop {
        points.push(p);
        if p == to {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            p.x += sx;
        }
        if e2 < dx {
            err += dx;
            p.y += sy;
        }
    }
    points
}

/// Stroke end points, truncated to pixels and clamped to the buffer
pub fn endpoints(stroke: &PlannedStroke, resolution: u32) -> (IVec2, IVec2) {
    let max = resolution.saturating_sub(1) as i32;
    let anchor = stroke.anchor.as_vec2();
    let reach = stroke.direction() * (stroke.length / 2.0);

    let clamp = |v: glam::Vec2| v.as_ivec2().clamp(IVec2::ZERO, IVec2::splat(max));
    (clamp(anchor - reach), clamp(anchor + reach))
}

/// Paints strokes into map buffers, masked by a [`PixelGrid`]
#[derive(Debug, Clone, Copy)]
pub struct Compositor<'a> {
    grid: &'a PixelGrid,
}

impl<'a> Compositor<'a> {
    pub fn new(grid: &'a PixelGrid) -> Self {
        Self { grid }
    }

    /// Blend `stroke` into `buffer` with `color`.
    ///
    /// Returns the number of pixel blends performed.
    pub fn paint(&self, buffer: &mut MapBuffer, stroke: &PlannedStroke, color: [f32; 4]) -> usize {
        let resolution = self.grid.resolution();
        if resolution == 0 {
            return 0;
        }
        let max = resolution as i32 - 1;

        let (from, to) = endpoints(stroke, resolution);
        let path = trace_line(from, to);
        let steps = path.len().saturating_sub(1);
        let opacity = stroke.opacity;
        let mut blends = 0;

        for (step, p) in path.iter().enumerate() {
            if !stroke.target.matches(self.grid.get(p.x as u32, p.y as u32)) {
                continue;
            }

            let t = if steps == 0 { 0.0 } else { step as f32 / steps as f32 };
            // Square brush whose side is the tapered thickness
            let half = (taper(stroke.width, t) / 2) as i32;
            let lo = (*p - IVec2::splat(half)).max(IVec2::ZERO);
            let hi = (*p + IVec2::splat(half)).min(IVec2::splat(max));

            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let (x, y) = (x as u32, y as u32);
                    if !stroke.target.matches(self.grid.get(x, y)) {
                        continue;
                    }
                    let px = buffer.pixel_mut(x, y);
                    for c in 0..3 {
                        px[c] = px[c] * (1.0 - opacity) + color[c] * opacity;
                    }
                    px[3] = 1.0;
                    blends += 1;
                }
            }
        }

        blends
    }

    /// Paint a shaded stroke into both the normal and the color map
    pub fn composite(&self, maps: &mut PainterlyMaps, stroke: &Stroke) -> usize {
        self.paint(&mut maps.normal, &stroke.plan, stroke.normal_color)
            + self.paint(&mut maps.color, &stroke.plan, stroke.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::NEUTRAL_GRAY;
    use crate::planner::{MaskTarget, StrokePass};
    use glam::UVec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    /// Grid split down the middle: region 0 on the left, region 1 on the right
    fn split_grid(res: u32) -> PixelGrid {
        let mut grid = PixelGrid::new(res);
        for y in 0..res {
            for x in 0..res {
                let rec = grid.get_mut(x, y);
                rec.owner = Some(0);
                rec.region = Some(if x < res / 2 { 0 } else { 1 });
            }
        }
        grid
    }

    fn stroke_at(anchor: UVec2, angle: f32, target: MaskTarget) -> PlannedStroke {
        PlannedStroke {
            anchor,
            angle,
            width: 9.0,
            length: 30.0,
            opacity: 0.8,
            jitter: 0.0,
            target,
            pass: StrokePass::Coverage,
        }
    }

    #[test]
    fn test_taper_profile() {
        assert_eq!(taper(10.0, 0.5), 10);
        assert_eq!(taper(10.0, 0.0), 5);
        assert_eq!(taper(10.0, 1.0), 5);
        assert_eq!(taper(1.0, 0.0), 1);
        assert!(taper(10.0, 0.25) > taper(10.0, 0.1));
    }

    #[test]
    fn test_trace_line_endpoints_and_steps() {
        let path = trace_line(IVec2::new(0, 0), IVec2::new(5, 2));
        assert_eq!(path.first(), Some(&IVec2::new(0, 0)));
        assert_eq!(path.last(), Some(&IVec2::new(5, 2)));
        assert_eq!(path.len(), 6);

        let back = trace_line(IVec2::new(3, 7), IVec2::new(3, 1));
        assert_eq!(back.len(), 7);
        assert!(back.iter().all(|p| p.x == 3));

        assert_eq!(trace_line(IVec2::ONE, IVec2::ONE), vec![IVec2::ONE]);
    }

    #[test]
    fn test_endpoints_clamped() {
        let stroke = stroke_at(UVec2::new(1, 1), 0.0, MaskTarget::Region(0));
        let (from, to) = endpoints(&stroke, 16);
        assert_eq!(from, IVec2::new(0, 1));
        assert_eq!(to, IVec2::new(15, 1));
    }

    #[test]
    fn test_stroke_never_crosses_region_border() {
        let res = 32;
        let grid = split_grid(res);
        let compositor = Compositor::new(&grid);
        let mut buffer = MapBuffer::filled(res, res, NEUTRAL_GRAY);

        // Anchored next to the border, pointing straight across it
        let stroke = stroke_at(UVec2::new(14, 16), 0.0, MaskTarget::Region(0));
        let blends = compositor.paint(&mut buffer, &stroke, [1.0, 0.0, 0.0, 1.0]);
        assert!(blends > 0);

        for y in 0..res {
            for x in 0..res {
                if buffer.get_pixel(x, y) != NEUTRAL_GRAY {
                    assert_eq!(grid.get(x, y).region, Some(0), "pixel ({x}, {y})");
                }
            }
        }
        assert_ne!(buffer.get_pixel(14, 16), NEUTRAL_GRAY);
    }

    #[test]
    fn test_object_mask_crosses_regions() {
        let res = 32;
        let grid = split_grid(res);
        let mut buffer = MapBuffer::filled(res, res, NEUTRAL_GRAY);
        let stroke = stroke_at(UVec2::new(14, 16), 0.0, MaskTarget::Object(0));
        Compositor::new(&grid).paint(&mut buffer, &stroke, [1.0, 0.0, 0.0, 1.0]);
        assert_ne!(buffer.get_pixel(20, 16), NEUTRAL_GRAY);
    }

    #[test]
    fn test_blend_formula() {
        let res = 8;
        let grid = split_grid(res);
        let mut buffer = MapBuffer::filled(res, res, [0.5, 0.5, 0.5, 0.25]);
        let stroke = PlannedStroke {
            width: 1.0,
            length: 0.0,
            ..stroke_at(UVec2::new(1, 1), 0.0, MaskTarget::Region(0))
        };
        let blends = Compositor::new(&grid).paint(&mut buffer, &stroke, [1.0, 0.0, 0.25, 1.0]);
        assert_eq!(blends, 1);

        let px = buffer.get_pixel(1, 1);
        assert!((px[0] - 0.9).abs() < 1e-6);
        assert!((px[1] - 0.1).abs() < 1e-6);
        assert!((px[2] - 0.3).abs() < 1e-6);
        assert_eq!(px[3], 1.0);
    }

    #[test]
    fn test_brush_extent_is_half_the_tapered_thickness() {
        let res = 32;
        let grid = split_grid(res);
        let mut buffer = MapBuffer::filled(res, res, NEUTRAL_GRAY);
        // Single-pixel path: t = 0, thickness floor(10 * 0.5) = 5, half-extent 2
        let stroke = PlannedStroke {
            width: 10.0,
            length: 0.0,
            ..stroke_at(UVec2::new(8, 16), 0.0, MaskTarget::Region(0))
        };
        let blends = Compositor::new(&grid).paint(&mut buffer, &stroke, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(blends, 25);
        assert_ne!(buffer.get_pixel(6, 14), NEUTRAL_GRAY);
        assert_ne!(buffer.get_pixel(10, 18), NEUTRAL_GRAY);
        assert_eq!(buffer.get_pixel(5, 16), NEUTRAL_GRAY);
        assert_eq!(buffer.get_pixel(8, 19), NEUTRAL_GRAY);
    }

    #[test]
    fn test_unowned_anchor_paints_nothing() {
        let res = 16;
        let grid = PixelGrid::new(res);
        let mut maps = PainterlyMaps::new(res);
        let mut rng = Pcg64::seed_from_u64(0);
        let plan = stroke_at(UVec2::new(8, 8), 0.3, MaskTarget::Region(0));
        let stroke = Stroke::shade(plan, [1.0, 1.0, 1.0], Vec3::Z, &mut rng);
        assert_eq!(Compositor::new(&grid).composite(&mut maps, &stroke), 0);
        assert_eq!(maps, PainterlyMaps::new(res));
    }

    #[test]
    fn test_composite_paints_both_maps() {
        let res = 32;
        let grid = split_grid(res);
        let mut maps = PainterlyMaps::new(res);
        let mut rng = Pcg64::seed_from_u64(0);
        let plan = stroke_at(UVec2::new(8, 16), 1.0, MaskTarget::Region(0));
        let stroke = Stroke::shade(plan, [0.9, 0.1, 0.1], Vec3::X, &mut rng);
        assert_eq!(stroke.color, [0.9, 0.1, 0.1, 1.0]);
        assert_eq!(stroke.normal_color, [1.0, 0.5, 0.5, 1.0]);

        Compositor::new(&grid).composite(&mut maps, &stroke);
        assert!(maps.normal.count_differing(crate::buffer::FLAT_NORMAL) > 0);
        assert!(maps.color.count_differing(NEUTRAL_GRAY) > 0);
    }
}
