//! Painterly map synthesis for UV-unwrapped meshes
//!
//! This library turns a set of mesh objects into two textures, a painterly
//! normal map and a painterly color map, by laying tapered brush strokes over
//! the objects' UV layouts. Strokes never bleed across face regions, UV islands
//! or objects.
//!
//! The pipeline runs in strict phases:
//!
//! 1. [`raster`] - fan-triangulate every face and record per-pixel ownership,
//!    flat normal and interpolated UV
//! 2. [`region`] - merge adjacent faces with similar normals into regions
//!    (union-find)
//! 3. [`planner`] / [`sampler`] - place coverage and accent strokes per region
//!    and pick their colors from the source texture
//! 4. [`compositor`] - blend each stroke into the output buffers, masked by
//!    ownership
//!
//! # Example
//! ```no_run
//! use glam::{Vec2, Vec3};
//! use painterly::mesh::{Face, MeshObject, shared_edges};
//! use painterly::{PainterlyConfig, run};
//!
//! let mut quad = MeshObject::new("Quad");
//! quad.faces.push(Face::new(
//!     vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
//!     Vec3::Z,
//! ));
//! quad.edges = shared_edges(&[vec![0, 1, 2, 3]]);
//!
//! let config = PainterlyConfig { resolution: 256, ..Default::default() };
//! let output = run(&[quad], &config)?;
//! painterly::export::write_maps(&output.maps, std::path::Path::new("out"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod buffer;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod mesh;
pub mod pipeline;
pub mod planner;
pub mod raster;
pub mod region;
pub mod sampler;

pub use buffer::{MapBuffer, PainterlyMaps};
pub use config::{MaskMode, PainterlyConfig};
pub use error::{PainterlyError, Result};
pub use pipeline::{PainterlyOutput, RunReport, run, run_seeded};
