//! A diffuse unit sphere lit by a single point light, seen from straight above
//! the light, plus a false-color image of its normals.
//!
//! Run with `RUST_LOG=info cargo run --example point_light`.

use std::f32::consts::PI;
use std::sync::Arc;

use anyhow::Result;
use lumen_renderer::{
    Bvh, Camera, Color, Film, GeometricPrimitive, IVec2, Light, Material, NormalIntegrator,
    PathIntegrator, RandomSampler, RenderConfig, SamplerIntegrator, Scene, Sphere, ThreadPool, Vec3,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let sphere = GeometricPrimitive::new(Sphere::new(Vec3::ZERO, 1.0), Some(Material::matte(Color::ONE)));
    let scene = Scene::new(
        Arc::new(Bvh::build(vec![sphere])?),
        vec![Arc::new(Light::point(Vec3::new(0.0, 0.0, 5.0), Color::splat(16.0 * PI)))],
    );

    let mut camera = Camera::new()
        .with_resolution(256, 256)
        .with_position(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y)
        .with_lens(15.0, 0.0, 10.0);
    camera.initialize();

    let config = RenderConfig::default().with_samples(4);
    let film = Film::new(IVec2::new(256, 256), config.filter);
    let integrator = PathIntegrator::new(&config, &scene);
    let pool = ThreadPool::new(config.threads)?;

    let stats = integrator.render(
        &scene,
        &camera,
        &RandomSampler::new(config.samples_per_pixel, config.seed),
        &film,
        &pool,
    )?;
    log::info!("{} tiles, {} samples in {:.2?}", stats.tiles, stats.samples, stats.elapsed);

    film.write_image("point_light.png")?;

    let normals = Film::new(IVec2::new(256, 256), config.filter);
    NormalIntegrator::new(&config).render(
        &scene,
        &camera,
        &RandomSampler::new(1, config.seed),
        &normals,
        &pool,
    )?;
    normals.write_image("point_light_normals.png")?;
    log::info!("Saved point_light.png and point_light_normals.png");
    Ok(())
}
