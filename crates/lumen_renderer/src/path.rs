//! Unidirectional path tracer with next-event estimation.
//!
//! Every non-specular vertex samples one light and combines a light sample
//! with a BSDF sample by multiple importance sampling. Emission found by
//! following the path is only added where light sampling could not have
//! found it: the camera vertex and after specular bounces.

use std::sync::Arc;

use lumen_math::{Ray, Vec2};

use crate::bsdf::BxdfType;
use crate::integrator::SamplerIntegrator;
use crate::interaction::Interaction;
use crate::light::Light;
use crate::material::Color;
use crate::renderer::{LightStrategy, RenderConfig};
use crate::sampler::Sampler;
use crate::sampling::{power_heuristic, Distribution1D};
use crate::scene::Scene;

/// Minimum probability of terminating a path once roulette starts.
const MIN_TERMINATION_PROBABILITY: f32 = 0.05;

pub struct PathIntegrator {
    max_depth: u32,
    russian_roulette: bool,
    roulette_after: u32,
    tile_size: u32,
    /// Light selection weights; `None` selects uniformly.
    light_distribution: Option<Distribution1D>,
}

impl PathIntegrator {
    /// Prepare an integrator for `scene`, building the light selection
    /// distribution the config asks for.
    pub fn new(config: &RenderConfig, scene: &Scene) -> Self {
        let light_distribution = match config.light_strategy {
            LightStrategy::Power if !scene.lights().is_empty() => {
                let powers: Vec<f32> = scene
                    .lights()
                    .iter()
                    .map(|light| luminance(light.power()))
                    .collect();
                Some(Distribution1D::new(&powers))
            }
            _ => None,
        };

        Self {
            max_depth: config.max_depth,
            russian_roulette: config.russian_roulette,
            roulette_after: config.roulette_after,
            tile_size: config.tile_size,
            light_distribution,
        }
    }

    /// Direct lighting from one light chosen by the configured strategy,
    /// divided by the probability of choosing it.
    pub fn sample_one_light<S: Sampler>(
        &self,
        isect: &Interaction,
        scene: &Scene,
        sampler: &mut S,
    ) -> Color {
        let lights = scene.lights();
        if lights.is_empty() {
            return Color::ZERO;
        }

        let u = sampler.get_1d();
        let (index, pdf) = match &self.light_distribution {
            Some(distribution) => distribution.sample_discrete(u),
            None => {
                let n = lights.len();
                (((u * n as f32) as usize).min(n - 1), 1.0 / n as f32)
            }
        };
        if pdf == 0.0 {
            return Color::ZERO;
        }

        let u_light = sampler.get_2d();
        let u_scattering = sampler.get_2d();
        estimate_direct(isect, &lights[index], u_light, u_scattering, scene) / pdf
    }
}

impl SamplerIntegrator for PathIntegrator {
    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn li<S: Sampler>(&self, ray: &Ray, scene: &Scene, sampler: &mut S) -> Color {
        let mut l = Color::ZERO;
        let mut beta = Color::ONE;
        let mut ray = *ray;
        let mut specular_bounce = false;
        // Undoes refraction compression for roulette only
        let mut eta_scale = 1.0;

        let mut bounce = 0;
        loop {
            let found = scene.intersect(&ray);

            if bounce == 0 || specular_bounce {
                match &found {
                    Some(isect) => l += beta * isect.le(-ray.direction),
                    None => {
                        if let Some(env) = scene.infinite_light() {
                            l += beta * env.le(&ray);
                        }
                    }
                }
            }

            let Some(mut isect) = found else {
                break;
            };
            if bounce >= self.max_depth {
                break;
            }

            isect.compute_scattering_functions();
            let Some(bsdf) = &isect.bsdf else {
                break;
            };

            if !bsdf.is_specular() {
                l += beta * self.sample_one_light(&isect, scene, sampler);
            }

            let Some(sample) = bsdf.sample_f(isect.wo, sampler.get_2d()) else {
                break;
            };
            if sample.f == Color::ZERO || sample.pdf == 0.0 {
                break;
            }

            beta *= sample.f * sample.wi.dot(isect.n).abs() / sample.pdf;
            specular_bounce = sample.sampled_type.contains(BxdfType::SPECULAR);
            eta_scale *= sample.eta_scale;
            ray = isect.spawn_ray(sample.wi);

            let rr_beta = beta * eta_scale;
            let max_component = rr_beta.max_element();
            if self.russian_roulette && bounce > self.roulette_after && max_component < 1.0 {
                let q = (1.0 - max_component).max(MIN_TERMINATION_PROBABILITY);
                if sampler.get_1d() < q {
                    break;
                }
                beta /= 1.0 - q;
            }

            bounce += 1;
        }

        l
    }
}

/// Direct lighting at `isect` from `light`, combining one light sample and,
/// for non-delta lights, one BSDF sample with the power heuristic.
pub fn estimate_direct(
    isect: &Interaction,
    light: &Arc<Light>,
    u_light: Vec2,
    u_scattering: Vec2,
    scene: &Scene,
) -> Color {
    let Some(bsdf) = &isect.bsdf else {
        return Color::ZERO;
    };
    let mut ld = Color::ZERO;

    // Light sampling
    if let Some(ls) = light.sample_li(isect, u_light) {
        if ls.pdf > 0.0 && ls.li != Color::ZERO {
            let f = bsdf.f(isect.wo, ls.wi) * ls.wi.dot(isect.n).abs();
            if f != Color::ZERO && ls.vis.unoccluded(scene) {
                if light.is_delta() {
                    ld += f * ls.li / ls.pdf;
                } else {
                    let scattering_pdf = bsdf.pdf(isect.wo, ls.wi);
                    let weight = power_heuristic(ls.pdf, scattering_pdf);
                    ld += f * ls.li * weight / ls.pdf;
                }
            }
        }
    }

    // BSDF sampling
    if light.is_delta() || bsdf.is_specular() {
        return ld;
    }
    let Some(bs) = bsdf.sample_f(isect.wo, u_scattering) else {
        return ld;
    };
    let f = bs.f * bs.wi.dot(isect.n).abs();
    if f == Color::ZERO || bs.pdf == 0.0 {
        return ld;
    }

    let light_pdf = light.pdf_li(isect, bs.wi);
    if light_pdf == 0.0 {
        return ld;
    }
    let weight = power_heuristic(bs.pdf, light_pdf);

    let ray = isect.spawn_ray(bs.wi);
    let li = match scene.intersect(&ray) {
        Some(hit) => match hit.area_light() {
            Some(hit_light) if Arc::ptr_eq(hit_light, light) => hit.le(-bs.wi),
            _ => Color::ZERO,
        },
        None => light.le(&ray),
    };

    ld + f * li * weight / bs.pdf
}

/// Rec. 709 luminance.
fn luminance(c: Color) -> f32 {
    0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
}
