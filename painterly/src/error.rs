//! Error types for the painterly pipeline

/// Errors raised while preparing or running the pipeline.
///
/// Only [`PainterlyError::NoObjects`] and [`PainterlyError::InvalidResolution`]
/// abort a run. The per-object variants are collected into the run report and
/// the affected object is skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PainterlyError {
    /// Nothing was selected for processing
    #[error("no objects to process")]
    NoObjects,

    /// Output resolution must be at least one pixel
    #[error("invalid resolution {0} (must be at least 1)")]
    InvalidResolution(u32),

    /// Object has no UV channel; unwrapping is the host's job
    #[error("object '{object}' has no UV layer")]
    MissingUvLayer { object: String },

    /// Object has no face with three or more loops and a usable normal
    #[error("object '{object}' has no valid faces")]
    NoValidFaces { object: String },

    /// Source image could not be cached
    #[error("texture cache failed: {reason}")]
    TextureCache { reason: String },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PainterlyError>;
