//! Mesh input model
//!
//! The host hands over each object as a list of faces (loop UVs plus a flat
//! normal), an edge-adjacency relation and a resolved material. Building this
//! from a live scene, unwrapping missing UVs and walking shader graphs all
//! happen on the host side.

use glam::{Vec2, Vec3};
use hashbrown::HashMap;

use crate::error::{PainterlyError, Result};

/// Faces with a shorter normal are treated as degenerate
pub const MIN_NORMAL_LENGTH: f32 = 1e-3;

/// Neutral gray used whenever no better color is known
pub const NEUTRAL_GRAY: [f32; 3] = [0.5, 0.5, 0.5];

/// A single polygon: its loop UVs in [0, 1] and its flat normal
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// One UV per loop, in winding order
    pub uvs: Vec<Vec2>,
    /// Flat face normal
    pub normal: Vec3,
}

impl Face {
    pub fn new(uvs: Vec<Vec2>, normal: Vec3) -> Self {
        Self { uvs, normal }
    }

    /// A face takes part in the pipeline when it can be triangulated and
    /// has a usable normal
    pub fn is_valid(&self) -> bool {
        self.uvs.len() >= 3 && self.normal.length() > MIN_NORMAL_LENGTH
    }

    /// Fan triangulation around the first loop, as loop-index triples
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (1..self.uvs.len().saturating_sub(1)).map(|i| [0, i, i + 1])
    }
}

/// A mesh edge and the faces (object-local indices) linked to it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edge {
    pub faces: Vec<usize>,
}

impl Edge {
    pub fn new(faces: Vec<usize>) -> Self {
        Self { faces }
    }
}

/// Flattened RGBA float image, row 0 at v = 0
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    /// RGBA values, 4 per pixel, row-major
    pub pixels: Vec<f32>,
}

/// Output contract of the host's material walker
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSource {
    /// Image linked to the base color, if one was found
    pub image: Option<SourceImage>,
    /// Flat base color used when no texture is cached
    pub base_color: [f32; 3],
}

impl Default for MaterialSource {
    fn default() -> Self {
        Self {
            image: None,
            base_color: NEUTRAL_GRAY,
        }
    }
}

/// One selected mesh object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshObject {
    pub name: String,
    pub faces: Vec<Face>,
    pub edges: Vec<Edge>,
    pub material: MaterialSource,
}

impl MeshObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether any face carries loop UVs
    pub fn has_uv_layer(&self) -> bool {
        self.faces.iter().any(|face| !face.uvs.is_empty())
    }

    /// Valid faces with their object-local indices
    pub fn valid_faces(&self) -> impl Iterator<Item = (usize, &Face)> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, face)| face.is_valid())
    }

    /// Face pairs sharing an edge that links exactly two valid faces
    pub fn adjacent_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter().filter_map(|edge| match edge.faces.as_slice() {
            &[a, b] if self.is_valid_face(a) && self.is_valid_face(b) => Some((a, b)),
            _ => None,
        })
    }

    /// Check that the object can be painted, returning its valid face count
    pub fn check(&self) -> Result<usize> {
        if !self.has_uv_layer() {
            return Err(PainterlyError::MissingUvLayer {
                object: self.name.clone(),
            });
        }

        match self.valid_faces().count() {
            0 => Err(PainterlyError::NoValidFaces {
                object: self.name.clone(),
            }),
            count => Ok(count),
        }
    }

    fn is_valid_face(&self, index: usize) -> bool {
        self.faces.get(index).is_some_and(Face::is_valid)
    }
}

/// Derive edge adjacency from polygons given as vertex-index loops.
///
/// Every undirected vertex pair that appears as a polygon side becomes one
/// [`Edge`] listing the polygons that use it. Edges are ordered by vertex pair.
pub fn shared_edges(polygons: &[Vec<u32>]) -> Vec<Edge> {
    let mut links: HashMap<(u32, u32), Vec<usize>> = HashMap::new();

    for (face, loop_verts) in polygons.iter().enumerate() {
        if loop_verts.len() < 2 {
            continue;
        }
        for i in 0..loop_verts.len() {
            let a = loop_verts[i];
            let b = loop_verts[(i + 1) % loop_verts.len()];
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            let faces = links.entry(key).or_default();
            if !faces.contains(&face) {
                faces.push(face);
            }
        }
    }

    let mut keyed: Vec<_> = links.into_iter().collect();
    keyed.sort_unstable_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, faces)| Edge::new(faces)).collect()
}
