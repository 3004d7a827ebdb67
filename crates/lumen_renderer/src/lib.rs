//! Lumen Renderer - CPU path tracing
//!
//! A unidirectional Monte Carlo path tracer for physically-based rendering:
//!
//! - **Acceleration**: [`Bvh`], a surface-area-heuristic BVH flattened into a
//!   depth-first node array
//! - **Light transport**: [`PathIntegrator`] with next-event estimation,
//!   multiple importance sampling and Russian roulette, driven tile by tile
//!   through [`SamplerIntegrator`]
//! - **Output**: [`Film`] accumulates filtered samples from tiles rendered on
//!   a [`ThreadPool`]
//!
//! # Example
//!
//! ```ignore
//! let (sphere, light) = GeometricPrimitive::emissive(
//!     Sphere::new(Vec3::new(0.0, 3.0, 0.0), 0.5),
//!     None,
//!     Color::splat(10.0),
//!     false,
//! );
//! let scene = Scene::new(Arc::new(Bvh::build(vec![sphere])?), vec![light]);
//! let config = RenderConfig::default();
//! let integrator = PathIntegrator::new(&config, &scene);
//! integrator.render(&scene, &camera, &sampler, &film, &ThreadPool::new(config.threads)?)?;
//! ```

mod bsdf;
mod bvh;
mod camera;
mod error;
mod film;
mod filter;
mod integrator;
mod interaction;
mod light;
mod material;
mod parallel;
mod path;
mod primitive;
mod renderer;
mod sampler;
pub mod sampling;
mod scene;
mod shape;
mod sphere;
mod tile;
mod triangle;

pub use bsdf::{Bsdf, Bxdf, BxdfSample, BxdfType, Fresnel};
pub use bvh::{Bvh, BvhOptions, LinearBvhNode, NodeContent};
pub use camera::Camera;
pub use error::{RenderError, RenderResult};
pub use film::{Film, FilmTile, Pixel};
pub use filter::Filter;
pub use integrator::{NormalIntegrator, RenderStats, SamplerIntegrator};
pub use interaction::{Interaction, RAY_ORIGIN_OFFSET_EPSILON, SHADOW_EPSILON};
pub use light::{DiffuseAreaLight, InfiniteLight, Light, LightSample, PointLight};
pub use material::{Color, Material};
pub use parallel::ThreadPool;
pub use path::{estimate_direct, PathIntegrator};
pub use primitive::{ClosestHit, GeometricPrimitive, Primitive, PrimitiveList};
pub use renderer::{LightStrategy, RenderConfig};
pub use sampler::{CameraSample, RandomSampler, Sampler};
pub use scene::{Scene, VisibilityTester};
pub use shape::{Shape, ShapeHit, ShapeSample};
pub use sphere::Sphere;
pub use tile::{generate_tiles, Tile, DEFAULT_TILE_SIZE};
pub use triangle::Triangle;

/// Re-export math types from lumen_math
pub use lumen_math::{Bounds2i, Bounds3, IVec2, Interval, Mat4, Ray, Vec2, Vec3};
