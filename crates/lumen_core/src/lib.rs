//! Lumen Core - geometry and image collaborators for the path tracer.
//!
//! This crate provides:
//!
//! - **Mesh data**: [`Mesh`], the plain triangle-mesh value type the renderer
//!   consumes, plus validation
//! - **Mesh loading**: [`load_obj`] via `tobj` and [`load_ply`] via `ply-rs`
//! - **Image output**: [`write_image`] for PNG, EXR and PFM
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::load_obj;
//!
//! let meshes = load_obj("assets/bunny.obj")?;
//! println!("Loaded {} triangles", meshes[0].triangle_count());
//! ```

pub mod image_io;
pub mod mesh;
pub mod obj;
pub mod ply;

// Re-export commonly used types
pub use image_io::{linear_to_srgb, write_image, ImageIoError, ImageIoResult};
pub use mesh::{Mesh, MeshError, MeshResult};
pub use obj::{load_obj, load_obj_from_reader};
pub use ply::{load_ply, load_ply_from_reader};
