//! Cornell box with a mirror sphere and a glass sphere under a quad area light.
//!
//! Usage: `cargo run --release --example cornell_glass [config.json] [extra.obj|extra.ply]`
//!
//! The optional JSON file overrides [`RenderConfig`] fields; an optional OBJ or
//! PLY mesh is scaled to fit, turned and stood on the floor at the back of the
//! box as white matte geometry.

use std::sync::Arc;

use anyhow::{Context, Result};
use lumen_core::{load_obj, load_ply, Mesh};
use lumen_renderer::{
    Bounds3, Bvh, Camera, Color, Film, GeometricPrimitive, IVec2, Light, Material, Mat4,
    PathIntegrator, RandomSampler, RenderConfig, SamplerIntegrator, Scene, Sphere, ThreadPool,
    Triangle, Vec3,
};

const RESOLUTION: u32 = 400;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => RenderConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load render config {}", path))?,
        None => RenderConfig::default().with_samples(64).with_max_depth(8),
    };
    let extra_mesh = args.next();

    let (mut primitives, lights) = cornell_box()?;
    primitives.push(GeometricPrimitive::new(
        Sphere::new(Vec3::new(-0.35, -0.6, -0.3), 0.4),
        Some(Material::mirror(Color::splat(0.9))),
    ));
    primitives.push(GeometricPrimitive::new(
        Sphere::new(Vec3::new(0.4, -0.6, 0.25), 0.4),
        Some(Material::glass(1.5)),
    ));

    if let Some(path) = extra_mesh {
        let meshes = if path.ends_with(".ply") {
            load_ply(&path)
        } else {
            load_obj(&path)
        }
        .with_context(|| format!("Failed to load {}", path))?;

        let object_to_world = fit_on_floor(&meshes);
        for mesh in &meshes {
            for triangle in Triangle::from_mesh(&mesh.transformed(&object_to_world))? {
                primitives.push(GeometricPrimitive::new(triangle, Some(Material::matte(Color::splat(0.73)))));
            }
        }
        log::info!("Added {} meshes from {}", meshes.len(), path);
    }

    let start = std::time::Instant::now();
    let bvh = Bvh::build(primitives)?;
    log::info!(
        "BVH: {} nodes, {} leaves, depth {}, built in {:.2?}",
        bvh.node_count(),
        bvh.leaf_count(),
        bvh.depth(),
        start.elapsed()
    );
    let scene = Scene::new(Arc::new(bvh), lights);

    let mut camera = Camera::new()
        .with_resolution(RESOLUTION, RESOLUTION)
        .with_position(Vec3::new(0.0, 0.0, 3.4), Vec3::ZERO, Vec3::Y)
        .with_lens(40.0, 0.0, 3.4);
    camera.initialize();

    let film = Film::new(IVec2::splat(RESOLUTION as i32), config.filter);
    let integrator = PathIntegrator::new(&config, &scene);
    let pool = ThreadPool::new(config.threads)?;
    let sampler = RandomSampler::new(config.samples_per_pixel, config.seed);

    let stats = integrator.render(&scene, &camera, &sampler, &film, &pool)?;
    log::info!("Rendered {} samples in {:.2?}", stats.samples, stats.elapsed);

    film.write_image("cornell_glass.png")?;
    film.write_image("cornell_glass.exr")?;
    log::info!("Saved cornell_glass.png and cornell_glass.exr");
    Ok(())
}

/// The box spans [-1, 1]³ and is open towards +z.
fn cornell_box() -> Result<(Vec<GeometricPrimitive>, Vec<Arc<Light>>)> {
    let white = Material::matte(Color::splat(0.73));
    let red = Material::matte(Color::new(0.65, 0.05, 0.05));
    let green = Material::matte(Color::new(0.12, 0.45, 0.15));

    let walls = [
        // floor, ceiling, back
        ([-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], white),
        ([-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0], white),
        ([-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0], white),
        // left, right
        ([-1.0, -1.0, 1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], red),
        ([1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], green),
    ];

    let mut primitives = Vec::new();
    for (a, b, c, d, material) in walls {
        for triangle in quad(a, b, c, d)? {
            primitives.push(GeometricPrimitive::new(triangle, Some(material)));
        }
    }

    // Facing down, just below the ceiling
    let y = 0.999;
    let mut lights = Vec::new();
    for triangle in quad([0.3, y, -0.3], [0.3, y, 0.3], [-0.3, y, 0.3], [-0.3, y, -0.3])? {
        let (primitive, light) =
            GeometricPrimitive::emissive(triangle, None, Color::new(17.0, 12.0, 4.0), false);
        primitives.push(primitive);
        lights.push(light);
    }

    Ok((primitives, lights))
}

/// Two triangles for the quad `a b c d`; the front face follows the winding.
fn quad(a: [f32; 3], b: [f32; 3], c: [f32; 3], d: [f32; 3]) -> Result<Vec<Triangle>> {
    let mesh = Mesh::new(
        [a, b, c, d].into_iter().map(Vec3::from).collect(),
        vec![0, 1, 2, 0, 2, 3],
        None,
    );
    Ok(Triangle::from_mesh(&mesh)?)
}

/// Scale the meshes to 0.6 units across, turn them 30° and stand them on the
/// floor behind the spheres.
fn fit_on_floor(meshes: &[Mesh]) -> Mat4 {
    let bounds = meshes
        .iter()
        .fold(Bounds3::EMPTY, |b, mesh| b.union(&mesh.bounds));
    let size = bounds.diagonal();
    let scale = 0.6 / size.max_element().max(f32::EPSILON);
    let center = (bounds.min + bounds.max) * 0.5;

    Mat4::from_translation(Vec3::new(0.0, -1.0 + 0.5 * scale * size.y, -0.55))
        * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_6)
        * Mat4::from_scale(Vec3::splat(scale))
        * Mat4::from_translation(-center)
}
