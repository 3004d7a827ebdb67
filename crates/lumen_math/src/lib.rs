//! Lumen math types.
//!
//! Re-exports `glam` and adds the small set of geometric types the path
//! tracer needs on top of it: rays, parametric intervals, 3D bounds with a
//! watertight slab test, integer pixel rectangles and shading frames.

// Re-export glam for convenience
pub use glam::*;

mod bounds;
mod bounds2;
mod frame;
mod interval;
mod ray;

pub use bounds::{dir_is_neg, gamma, Bounds3};
pub use bounds2::Bounds2i;
pub use frame::ShadingFrame;
pub use interval::Interval;
pub use ray::Ray;
