//! Fatal errors raised while setting up or finishing a render.
//!
//! Numeric trouble inside the hot loops (zero pdfs, degenerate geometry) never
//! shows up here; it is absorbed where it happens.

use lumen_core::{ImageIoError, MeshError};
use lumen_math::IVec2;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot build a BVH over zero primitives")]
    EmptyPrimitives,

    #[error("BVH depth {depth} exceeds the traversal stack limit of {limit}")]
    BvhTooDeep { depth: usize, limit: usize },

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("Camera resolution {camera} does not match film resolution {film}")]
    ResolutionMismatch { camera: IVec2, film: IVec2 },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Image output error: {0}")]
    Image(#[from] ImageIoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid render config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for render setup operations.
pub type RenderResult<T> = Result<T, RenderError>;
