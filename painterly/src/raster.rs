//! UV-space rasterization of mesh faces
//!
//! Faces are fan-triangulated and each triangle is rasterized conservatively:
//! a pixel counts as covered when any of its corners, its center, or any of
//! its sides touches the triangle. A center-only test leaves hairline gaps
//! along shared triangle edges, which would later show up as unpainted seams.
//!
//! Pixel (x, y) has its center at (x, y) in pixel space, where UV (1, 1)
//! maps to (R - 1, R - 1).

use glam::{Vec2, Vec3};

use crate::mesh::MeshObject;
use crate::region::Segmentation;

/// Triangles whose barycentric denominator (squared doubled area) falls
/// below this are treated as degenerate
pub const DEGENERATE_EPSILON: f32 = 1e-5;

/// What the rasterizer knows about one output pixel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRecord {
    /// Index of the owning object
    pub owner: Option<u32>,
    /// Global region id, filled in after segmentation
    pub region: Option<u32>,
    /// Global id of the face that last covered this pixel
    pub face: Option<u32>,
    /// Interpolated UV in [0, 1] space
    pub uv: Vec2,
    /// Flat normal of the owning face
    pub normal: Vec3,
}

/// Per-pixel ownership, normal and UV records for the whole output
#[derive(Debug, Clone)]
pub struct PixelGrid {
    resolution: u32,
    records: Vec<PixelRecord>,
}

impl PixelGrid {
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution,
            records: vec![PixelRecord::default(); resolution as usize * resolution as usize],
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.resolution as usize + x as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> &PixelRecord {
        &self.records[self.index(x, y)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut PixelRecord {
        let idx = self.index(x, y);
        &mut self.records[idx]
    }

    /// Records with their pixel coordinates, row by row
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &PixelRecord)> {
        let res = self.resolution.max(1);
        self.records
            .iter()
            .enumerate()
            .map(move |(i, r)| ((i as u32) % res, (i as u32) / res, r))
    }

    /// Number of pixels owned by `object`
    pub fn owned_count(&self, object: u32) -> usize {
        self.records
            .iter()
            .filter(|r| r.owner == Some(object))
            .count()
    }

    /// Write region ids for every pixel whose face belongs to `segmentation`.
    ///
    /// Returns the number of pixels updated.
    pub fn assign_regions(&mut self, segmentation: &Segmentation) -> usize {
        let mut assigned = 0;
        for record in &mut self.records {
            if let Some(region) = record.face.and_then(|f| segmentation.region_of(f as usize)) {
                record.region = Some(region);
                assigned += 1;
            }
        }
        assigned
    }
}

/// Counters from rasterizing one object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Triangles produced by fan triangulation
    pub triangles: usize,
    /// Pixel writes (a pixel covered by two triangles counts twice)
    pub pixels_written: usize,
    /// Writes that replaced another object's ownership
    pub overwritten_foreign: usize,
    /// Covered pixels rejected by the degenerate barycentric check
    pub degenerate_pixels: usize,
}

/// Barycentric weights of `p` with respect to triangle `tri`.
///
/// Returns the weights of (a, b, c), or `None` if the triangle is degenerate.
/// Weights are signed-area ratios evaluated in f64; pixel-space coordinates
/// reach the thousands, where f32 loses too much on long, thin triangles.
pub fn barycentric(p: Vec2, tri: &[Vec2; 3]) -> Option<[f32; 3]> {
    let [a, b, c] = tri.map(|v| v.as_dvec2());
    let p = p.as_dvec2();
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    // Twice the signed area; its square equals the Gram determinant
    let area = ab.perp_dot(ac);
    if area * area < DEGENERATE_EPSILON as f64 {
        return None;
    }

    let wb = ap.perp_dot(ac) / area;
    let wc = ab.perp_dot(ap) / area;
    Some([(1.0 - wb - wc) as f32, wb as f32, wc as f32])
}

/// Inclusive point-in-triangle test
pub fn point_in_triangle(p: Vec2, tri: &[Vec2; 3]) -> bool {
    barycentric(p, tri).is_some_and(|w| w.iter().all(|&x| x >= 0.0))
}

/// Whether segments p1-p2 and p3-p4 intersect. Parallel segments never do.
pub fn segments_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> bool {
    let r = p2 - p1;
    let q = p4 - p3;
    let det = r.perp_dot(q);
    if det.abs() < DEGENERATE_EPSILON {
        return false;
    }

    let diff = p3 - p1;
    let s = diff.perp_dot(q) / det;
    let t = diff.perp_dot(r) / det;
    (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t)
}

/// Conservative coverage test for the pixel centered at `center`
pub fn pixel_covered(center: Vec2, tri: &[Vec2; 3]) -> bool {
    let corners = [
        center + Vec2::new(-0.5, -0.5),
        center + Vec2::new(0.5, -0.5),
        center + Vec2::new(0.5, 0.5),
        center + Vec2::new(-0.5, 0.5),
    ];

    if corners.iter().any(|&c| point_in_triangle(c, tri)) || point_in_triangle(center, tri) {
        return true;
    }

    (0..4).any(|i| {
        let (c0, c1) = (corners[i], corners[(i + 1) % 4]);
        (0..3).any(|j| segments_intersect(c0, c1, tri[j], tri[(j + 1) % 3]))
    })
}

/// Writes face attributes into a [`PixelGrid`]
#[derive(Debug, Clone, Copy)]
pub struct Rasterizer {
    resolution: u32,
}

impl Rasterizer {
    pub fn new(resolution: u32) -> Self {
        Self { resolution }
    }

    /// Scale of UV space into pixel space
    fn scale(&self) -> f32 {
        self.resolution.saturating_sub(1) as f32
    }

    /// Rasterize every valid face of `object`.
    ///
    /// `face_offset` turns object-local face indices into global face ids.
    pub fn rasterize_object(
        &self,
        grid: &mut PixelGrid,
        object_index: u32,
        object: &MeshObject,
        face_offset: usize,
    ) -> RasterStats {
        let mut stats = RasterStats::default();

        for (local, face) in object.valid_faces() {
            let face_id = (face_offset + local) as u32;
            for [i0, i1, i2] in face.triangles() {
                let uvs = [face.uvs[i0], face.uvs[i1], face.uvs[i2]];
                stats.triangles += 1;
                self.rasterize_triangle(grid, object_index, face_id, face.normal, &uvs, &mut stats);
            }
        }

        stats
    }

    fn rasterize_triangle(
        &self,
        grid: &mut PixelGrid,
        object_index: u32,
        face_id: u32,
        normal: Vec3,
        uvs: &[Vec2; 3],
        stats: &mut RasterStats,
    ) {
        if self.resolution == 0 {
            return;
        }

        let scale = self.scale();
        let tri = uvs.map(|uv| uv * scale);

        let max_index = (self.resolution - 1) as f32;
        let lo = tri[0].min(tri[1]).min(tri[2]);
        let hi = tri[0].max(tri[1]).max(tri[2]);

        // Expand the box by one pixel, then clamp to the grid
        let min_x = (lo.x - 1.0).floor().clamp(0.0, max_index) as u32;
        let min_y = (lo.y - 1.0).floor().clamp(0.0, max_index) as u32;
        let max_x = (hi.x + 1.0).floor().clamp(0.0, max_index) as u32;
        let max_y = (hi.y + 1.0).floor().clamp(0.0, max_index) as u32;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = Vec2::new(x as f32, y as f32);
                if !pixel_covered(center, &tri) {
                    continue;
                }

                let Some([wa, wb, wc]) = barycentric(center, &tri) else {
                    stats.degenerate_pixels += 1;
                    continue;
                };

                let record = grid.get_mut(x, y);
                if record.owner.is_some_and(|o| o != object_index) {
                    stats.overwritten_foreign += 1;
                }

                record.owner = Some(object_index);
                record.face = Some(face_id);
                record.region = None;
                record.normal = normal;
                record.uv = (uvs[0].as_dvec2() * wa as f64
                    + uvs[1].as_dvec2() * wb as f64
                    + uvs[2].as_dvec2() * wc as f64)
                    .as_vec2();
                stats.pixels_written += 1;
            }
        }
    }
}
