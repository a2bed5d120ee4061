//! JSON scene loading
//!
//! A scene is the host side of the pipeline: it lists mesh objects with their
//! per-face UVs and normals, optional adjacency, and an optional base color
//! texture per object.
//!
//! ```json
//! {
//!   "objects": [
//!     {
//!       "name": "Crate",
//!       "texture": "crate_albedo.png",
//!       "base_color": [0.6, 0.4, 0.2],
//!       "faces": [
//!         { "normal": [0, 0, 1], "uvs": [[0, 0], [1, 0], [1, 1], [0, 1]], "vertices": [0, 1, 2, 3] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Edges are derived from face `vertices` unless the object lists them
//! explicitly as face-index groups.

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use painterly::mesh::{Edge, Face, MaterialSource, MeshObject, NEUTRAL_GRAY, SourceImage, shared_edges};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Scene file root
#[derive(Debug, Deserialize)]
pub struct SceneFile {
    pub objects: Vec<ObjectEntry>,
}

/// One object in the scene file
#[derive(Debug, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    pub faces: Vec<FaceEntry>,
    /// Face-index groups sharing an edge; derived from vertices when absent
    #[serde(default)]
    pub edges: Option<Vec<Vec<usize>>>,
    /// Base color image, relative to the scene file
    #[serde(default)]
    pub texture: Option<PathBuf>,
    #[serde(default)]
    pub base_color: Option<[f32; 3]>,
}

/// One face in the scene file
#[derive(Debug, Deserialize)]
pub struct FaceEntry {
    pub normal: [f32; 3],
    #[serde(default)]
    pub uvs: Vec<[f32; 2]>,
    /// Vertex indices in loop order, used to derive adjacency
    #[serde(default)]
    pub vertices: Vec<u32>,
}

impl SceneFile {
    /// Load scene from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse scene from string
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse scene JSON")
    }

    /// Convert to mesh objects, loading textures relative to `base_dir`
    pub fn into_objects(self, base_dir: &Path) -> Vec<MeshObject> {
        self.objects
            .into_iter()
            .map(|entry| entry.into_object(base_dir))
            .collect()
    }
}

impl ObjectEntry {
    fn into_object(self, base_dir: &Path) -> MeshObject {
        let edges = match self.edges {
            Some(groups) => groups.into_iter().map(Edge::new).collect(),
            None => {
                let loops: Vec<Vec<u32>> = self.faces.iter().map(|f| f.vertices.clone()).collect();
                shared_edges(&loops)
            }
        };

        let faces = self
            .faces
            .into_iter()
            .map(|face| {
                Face::new(
                    face.uvs.into_iter().map(Vec2::from).collect(),
                    Vec3::from(face.normal),
                )
            })
            .collect();

        let image = self.texture.and_then(|texture| {
            let path = base_dir.join(texture);
            match load_image(&path) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!(object = %self.name, "Failed to load texture: {:#}", e);
                    None
                }
            }
        });

        MeshObject {
            name: self.name,
            faces,
            edges,
            material: MaterialSource {
                image,
                base_color: self.base_color.unwrap_or(NEUTRAL_GRAY),
            },
        }
    }
}

/// Decode an image into float RGBA with row 0 at v = 0
pub fn load_image(path: &Path) -> Result<SourceImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?
        .flipv()
        .to_rgba32f();

    Ok(SourceImage {
        width: img.width(),
        height: img.height(),
        pixels: img.into_raw(),
    })
}
