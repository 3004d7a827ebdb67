//! Integrators that estimate radiance one camera ray at a time, and the tile
//! driver they share.

use std::time::{Duration, Instant};

use lumen_math::Ray;

use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::film::Film;
use crate::material::Color;
use crate::parallel::ThreadPool;
use crate::renderer::RenderConfig;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::tile::generate_tiles;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub tiles: usize,
    pub samples: u64,
    pub elapsed: Duration,
}

/// An integrator driven by camera samples.
///
/// Implementors only estimate the radiance along one ray; [`render`] splits
/// the film into tiles and runs them on a pool.
///
/// [`render`]: SamplerIntegrator::render
pub trait SamplerIntegrator: Sync {
    /// Edge length of the square tiles `render` hands to workers.
    fn tile_size(&self) -> u32;

    /// Radiance arriving at the origin of `ray` from its direction.
    fn li<S: Sampler>(&self, ray: &Ray, scene: &Scene, sampler: &mut S) -> Color;

    /// Render every pixel of `film`, tile by tile on `pool`.
    ///
    /// Each tile clones `sampler` seeded with the tile index, so the image
    /// does not depend on how tiles are scheduled.
    fn render<S>(
        &self,
        scene: &Scene,
        camera: &Camera,
        sampler: &S,
        film: &Film,
        pool: &ThreadPool,
    ) -> RenderResult<RenderStats>
    where
        S: Sampler + Sync,
    {
        if camera.resolution() != film.resolution() {
            return Err(RenderError::ResolutionMismatch {
                camera: camera.resolution(),
                film: film.resolution(),
            });
        }

        let start = Instant::now();
        let tiles = generate_tiles(film.sample_bounds(), self.tile_size());
        log::info!(
            "Rendering {}x{} at {} spp in {} tiles on {} workers",
            film.resolution().x,
            film.resolution().y,
            sampler.samples_per_pixel(),
            tiles.len(),
            pool.workers() + 1
        );

        pool.parallel_for(tiles.len(), |i| {
            let tile = &tiles[i];
            let mut tile_sampler = sampler.clone_seeded(tile.index as u64);
            let mut film_tile = film.film_tile(tile.bounds);

            for pixel in tile.bounds.iter() {
                tile_sampler.start_pixel(pixel);
                loop {
                    let camera_sample = tile_sampler.get_camera_sample(pixel);
                    let ray = camera.generate_ray(&camera_sample);

                    let mut l = self.li(&ray, scene, &mut tile_sampler);
                    if !l.is_finite() {
                        log::error!("Non-finite radiance {:?} at pixel {:?}, discarding", l, pixel);
                        l = Color::ZERO;
                    }
                    film_tile.add_sample(camera_sample.p_film, l);

                    if !tile_sampler.start_next_sample() {
                        break;
                    }
                }
            }

            film.merge_film_tile(film_tile);
            log::debug!("Finished tile {} ({:?})", tile.index, tile.bounds);
        });

        let stats = RenderStats {
            tiles: tiles.len(),
            samples: film.sample_bounds().area() as u64 * sampler.samples_per_pixel() as u64,
            elapsed: start.elapsed(),
        };
        log::info!(
            "Rendered {} samples in {:.2?}",
            stats.samples,
            stats.elapsed
        );
        Ok(stats)
    }
}

/// Shows the absolute surface normal at the first hit as a color; misses are
/// black.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalIntegrator {
    tile_size: u32,
}

impl NormalIntegrator {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            tile_size: config.tile_size,
        }
    }
}

impl SamplerIntegrator for NormalIntegrator {
    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn li<S: Sampler>(&self, ray: &Ray, scene: &Scene, _sampler: &mut S) -> Color {
        match scene.intersect(ray) {
            Some(isect) => isect.n.abs(),
            None => Color::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::Bvh;
    use crate::filter::Filter;
    use crate::light::Light;
    use crate::material::Material;
    use crate::primitive::GeometricPrimitive;
    use crate::sampler::RandomSampler;
    use crate::sphere::Sphere;
    use lumen_math::{IVec2, Vec3};
    use std::sync::Arc;

    fn lit_sphere() -> Scene {
        let sphere = GeometricPrimitive::new(
            Sphere::new(Vec3::ZERO, 1.0),
            Some(Material::matte(Color::ONE)),
        );
        Scene::new(
            Arc::new(Bvh::build(vec![sphere]).unwrap()),
            vec![Arc::new(Light::point(Vec3::new(0.0, 0.0, 5.0), Color::splat(10.0)))],
        )
        .with_environment(Color::splat(0.5))
    }

    #[test]
    fn test_normal_integrator_li() {
        let scene = lit_sphere();
        let integrator = NormalIntegrator::new(&RenderConfig::default());
        let mut sampler = RandomSampler::new(1, 0);

        let top = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
        assert!((integrator.li(&top, &scene, &mut sampler) - Vec3::Z).length() < 1e-5);

        // Negative components fold onto the positive axis
        let side = Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::X);
        assert!((integrator.li(&side, &scene, &mut sampler) - Vec3::X).length() < 1e-5);

        // The environment is not shown
        let miss = Ray::new(Vec3::new(5.0, 5.0, 10.0), -Vec3::Z);
        assert_eq!(integrator.li(&miss, &scene, &mut sampler), Color::ZERO);
    }

    #[test]
    fn test_normal_integrator_render() {
        let scene = lit_sphere();
        let resolution = 32;
        let mut camera = Camera::new()
            .with_resolution(resolution, resolution)
            .with_position(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y)
            .with_lens(20.0, 0.0, 10.0);
        camera.initialize();
        let film = Film::new(IVec2::splat(resolution as i32), Filter::default());
        let integrator = NormalIntegrator::new(&RenderConfig::default().with_tile_size(8));
        let pool = ThreadPool::new(Some(1)).unwrap();

        let stats = integrator
            .render(&scene, &camera, &RandomSampler::new(4, 0), &film, &pool)
            .unwrap();
        assert_eq!(stats.tiles, 16);

        // Just off the pole of the sphere, facing the camera
        let center = film.pixel(IVec2::new(16, 16)).resolve();
        assert!((center - Vec3::Z).length() < 0.15, "center {}", center);
        assert!(center.z > 0.99, "center {}", center);
        assert_eq!(film.pixel(IVec2::new(0, 0)).resolve(), Color::ZERO);
    }
}
