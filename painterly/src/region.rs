//! Normal-coherent face regions
//!
//! Adjacent faces whose normals differ by at most the configured angle are
//! merged with a union-find. Regions are the connected components of that
//! "similar normal" adjacency graph, so two faces can end up in one region
//! through a chain of small bends even when their own normals differ a lot.

use glam::Vec3;

use crate::error::Result;
use crate::mesh::MeshObject;

/// Disjoint-set forest over `0..n` with path compression and union by rank
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Root of `x`, compressing the path on the way
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Merge the sets holding `a` and `b`. Returns false if already merged.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }

        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }

    /// Number of disjoint sets
    pub fn component_count(&mut self) -> usize {
        (0..self.len()).filter(|&x| self.find(x) == x).count()
    }
}

/// Angle between two normals in radians.
///
/// The dot product is clamped before `acos` so that float drift on (anti)
/// parallel normals cannot produce NaN.
pub fn normal_angle(a: Vec3, b: Vec3) -> f32 {
    let cos = a.normalize_or_zero().dot(b.normalize_or_zero());
    cos.clamp(-1.0, 1.0).acos()
}

/// Region assignment for one object's faces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    face_offset: usize,
    /// Region per object-local face; `None` for invalid faces
    regions: Vec<Option<u32>>,
    first_region: u32,
    region_count: u32,
}

impl Segmentation {
    /// Region of a global face id, if that face belongs to this object
    pub fn region_of(&self, face_id: usize) -> Option<u32> {
        let local = face_id.checked_sub(self.face_offset)?;
        self.regions.get(local).copied().flatten()
    }

    /// Region of an object-local face index
    pub fn region_of_local(&self, local: usize) -> Option<u32> {
        self.regions.get(local).copied().flatten()
    }

    pub fn region_count(&self) -> usize {
        self.region_count as usize
    }

    /// Ids handed out to this object
    pub fn region_ids(&self) -> std::ops::Range<u32> {
        self.first_region..self.next_region_offset()
    }

    /// First id available to the next object
    pub fn next_region_offset(&self) -> u32 {
        self.first_region + self.region_count
    }

    /// Faces grouped by region, in region id order
    pub fn partition(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.region_count as usize];
        for (local, region) in self.regions.iter().enumerate() {
            if let Some(region) = region {
                groups[(region - self.first_region) as usize].push(local);
            }
        }
        groups
    }
}

/// Groups an object's faces into normal-coherent regions
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    threshold: f32,
}

impl Segmenter {
    /// Create a segmenter merging faces up to `threshold_degrees` apart
    pub fn new(threshold_degrees: f32) -> Self {
        Self {
            threshold: threshold_degrees.to_radians(),
        }
    }

    /// Segment `object`, numbering regions from `region_offset`.
    ///
    /// Ids are compacted in face order, so the first valid face always gets
    /// `region_offset`.
    pub fn segment(
        &self,
        object: &MeshObject,
        face_offset: usize,
        region_offset: u32,
    ) -> Result<Segmentation> {
        object.check()?;

        let mut sets = UnionFind::new(object.faces.len());
        let mut merged = 0usize;
        for (a, b) in object.adjacent_pairs() {
            let angle = normal_angle(object.faces[a].normal, object.faces[b].normal);
            if angle <= self.threshold && sets.union(a, b) {
                merged += 1;
            }
        }

        let mut root_ids: Vec<Option<u32>> = vec![None; object.faces.len()];
        let mut regions = vec![None; object.faces.len()];
        let mut next = region_offset;
        for (local, _) in object.valid_faces() {
            let root = sets.find(local);
            let id = *root_ids[root].get_or_insert_with(|| {
                next += 1;
                next - 1
            });
            regions[local] = Some(id);
        }

        let region_count = next - region_offset;
        tracing::debug!(
            object = %object.name,
            merges = merged,
            regions = region_count,
            "Created distinct face regions after merging"
        );

        Ok(Segmentation {
            face_offset,
            regions,
            first_region: region_offset,
            region_count,
        })
    }
}
