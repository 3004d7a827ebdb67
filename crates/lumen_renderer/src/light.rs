//! Light sources: point, diffuse area and constant environment.

use std::f32::consts::PI;
use std::sync::Arc;

use lumen_math::{Bounds3, Ray, Vec2, Vec3};

use crate::interaction::Interaction;
use crate::material::Color;
use crate::sampling::{uniform_sample_sphere, UNIFORM_SPHERE_PDF};
use crate::scene::VisibilityTester;
use crate::shape::Shape;

/// Incident radiance sampled from a light toward a reference point.
pub struct LightSample {
    pub li: Color,
    /// Unit direction from the reference point toward the light
    pub wi: Vec3,
    /// Solid-angle density of `wi`, or 1 for delta lights
    pub pdf: f32,
    pub vis: VisibilityTester,
}

/// Isotropic point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: Color,
}

/// Uniform emitter over a shape. Shares the shape with the primitive it lights.
#[derive(Debug, Clone)]
pub struct DiffuseAreaLight {
    shape: Arc<Shape>,
    radiance: Color,
    two_sided: bool,
}

impl DiffuseAreaLight {
    pub fn new(shape: Arc<Shape>, radiance: Color, two_sided: bool) -> Self {
        Self {
            shape,
            radiance,
            two_sided,
        }
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    fn emitted(&self, n: Vec3, w: Vec3) -> Color {
        if self.two_sided || n.dot(w) > 0.0 {
            self.radiance
        } else {
            Color::ZERO
        }
    }
}

/// Constant radiance arriving from every direction at infinity.
///
/// Only a [`Scene`](crate::Scene) can create one, since sampling needs the
/// scene's bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfiniteLight {
    radiance: Color,
    world_center: Vec3,
    world_radius: f32,
}

impl InfiniteLight {
    pub(crate) fn new(radiance: Color, world_bound: &Bounds3) -> Self {
        let (world_center, world_radius) = if world_bound.is_empty() {
            (Vec3::ZERO, 0.0)
        } else {
            world_bound.bounding_sphere()
        };
        Self {
            radiance,
            world_center,
            world_radius,
        }
    }

    pub fn radiance(&self) -> Color {
        self.radiance
    }
}

#[derive(Debug, Clone)]
pub enum Light {
    Point(PointLight),
    DiffuseArea(DiffuseAreaLight),
    Infinite(InfiniteLight),
}

impl Light {
    pub fn point(position: Vec3, intensity: Color) -> Self {
        Light::Point(PointLight {
            position,
            intensity,
        })
    }

    /// Delta lights can only be reached by light sampling.
    pub fn is_delta(&self) -> bool {
        matches!(self, Light::Point(_))
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Light::Infinite(_))
    }

    /// Sample incident illumination at `reference`. `None` when the light
    /// cannot contribute from there.
    pub fn sample_li(&self, reference: &Interaction, u: Vec2) -> Option<LightSample> {
        match self {
            Light::Point(light) => {
                let to_light = light.position - reference.p;
                let dist_sq = to_light.length_squared();
                if dist_sq == 0.0 {
                    return None;
                }
                Some(LightSample {
                    li: light.intensity / dist_sq,
                    wi: to_light / dist_sq.sqrt(),
                    pdf: 1.0,
                    vis: VisibilityTester::new(reference.detached(), Interaction::point(light.position)),
                })
            }
            Light::DiffuseArea(light) => {
                let (sample, pdf) = light.shape.sample_from(reference, u)?;
                let wi = (sample.p - reference.p).normalize();
                Some(LightSample {
                    li: light.emitted(sample.n, -wi),
                    wi,
                    pdf,
                    vis: VisibilityTester::new(
                        reference.detached(),
                        Interaction::new(sample.p, sample.n, -wi),
                    ),
                })
            }
            Light::Infinite(light) => {
                let wi = uniform_sample_sphere(u);
                // Far enough to leave the scene from anywhere inside it
                let target = reference.p + wi * (2.0 * light.world_radius);
                Some(LightSample {
                    li: light.radiance,
                    wi,
                    pdf: UNIFORM_SPHERE_PDF,
                    vis: VisibilityTester::new(reference.detached(), Interaction::point(target)),
                })
            }
        }
    }

    /// Solid-angle density with which [`Light::sample_li`] picks `wi`.
    pub fn pdf_li(&self, reference: &Interaction, wi: Vec3) -> f32 {
        match self {
            Light::Point(_) => 0.0,
            Light::DiffuseArea(light) => light.shape.pdf_from(reference, wi),
            Light::Infinite(_) => UNIFORM_SPHERE_PDF,
        }
    }

    /// Radiance carried by a ray that escapes the scene.
    pub fn le(&self, _ray: &Ray) -> Color {
        match self {
            Light::Infinite(light) => light.radiance,
            _ => Color::ZERO,
        }
    }

    /// Radiance leaving surface point `hit` in direction `w`.
    pub fn l(&self, hit: &Interaction, w: Vec3) -> Color {
        match self {
            Light::DiffuseArea(light) => light.emitted(hit.n, w),
            _ => Color::ZERO,
        }
    }

    /// Total emitted power, used to weight light selection.
    pub fn power(&self) -> Color {
        match self {
            Light::Point(light) => 4.0 * PI * light.intensity,
            Light::DiffuseArea(light) => {
                let sides = if light.two_sided { 2.0 } else { 1.0 };
                sides * PI * light.shape.area() * light.radiance
            }
            Light::Infinite(light) => PI * light.world_radius * light.world_radius * light.radiance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::Sphere;
    use crate::triangle::Triangle;

    #[test]
    fn test_point_light_falloff() {
        let light = Light::point(Vec3::new(0.0, 0.0, 5.0), Color::splat(16.0));
        let reference = Interaction::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Z, Vec3::Z);

        let ls = light.sample_li(&reference, Vec2::ZERO).unwrap();
        assert!((ls.li - Color::ONE).abs().max_element() < 1e-5);
        assert_eq!(ls.wi, Vec3::Z);
        assert_eq!(ls.pdf, 1.0);
        assert!(light.is_delta());
        assert_eq!(light.pdf_li(&reference, Vec3::Z), 0.0);
        assert!((light.power().x - 64.0 * PI).abs() < 1e-3);
    }

    #[test]
    fn test_area_light_one_sided() {
        // Downward-facing triangle above the origin
        let shape = Arc::new(Shape::from(Triangle::new(
            Vec3::new(-1.0, -1.0, 2.0),
            Vec3::new(-1.0, 1.0, 2.0),
            Vec3::new(1.0, -1.0, 2.0),
        )));
        assert!(shape.bounds().min.z == 2.0);
        let light = Light::DiffuseArea(DiffuseAreaLight::new(shape.clone(), Color::ONE, false));

        let below = Interaction::new(Vec3::new(-0.3, -0.3, 0.0), Vec3::Z, Vec3::Z);
        let ls = light.sample_li(&below, Vec2::new(0.5, 0.5)).unwrap();
        assert!(ls.wi.z > 0.0);
        assert_eq!(ls.li, Color::ONE);
        assert!((light.pdf_li(&below, ls.wi) - ls.pdf).abs() / ls.pdf < 1e-3);

        // The back face does not emit
        let above = Interaction::new(Vec3::new(-0.3, -0.3, 4.0), -Vec3::Z, -Vec3::Z);
        let ls = light.sample_li(&above, Vec2::new(0.5, 0.5)).unwrap();
        assert_eq!(ls.li, Color::ZERO);

        assert!(!light.is_delta());
        assert!((light.power().x - PI * 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_infinite_light() {
        let bounds = Sphere::new(Vec3::ZERO, 1.0).bounds();
        let light = Light::Infinite(InfiniteLight::new(Color::splat(0.5), &bounds));
        let reference = Interaction::new(Vec3::ZERO, Vec3::Z, Vec3::Z);

        let ls = light.sample_li(&reference, Vec2::new(0.2, 0.7)).unwrap();
        assert_eq!(ls.li, Color::splat(0.5));
        assert_eq!(ls.pdf, UNIFORM_SPHERE_PDF);
        assert_eq!(light.pdf_li(&reference, ls.wi), UNIFORM_SPHERE_PDF);
        assert_eq!(light.le(&Ray::new(Vec3::ZERO, Vec3::X)), Color::splat(0.5));
        assert!(light.is_infinite());
    }
}
