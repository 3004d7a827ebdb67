//! Sphere shape.

use std::f32::consts::PI;

use lumen_math::{Bounds3, Interval, Ray, Vec2, Vec3};

use crate::sampling::uniform_sample_sphere;
use crate::shape::{ShapeHit, ShapeSample};

/// A sphere given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn bounds(&self) -> Bounds3 {
        let rvec = Vec3::splat(self.radius);
        Bounds3::from_points(self.center - rvec, self.center + rvec)
    }

    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<ShapeHit> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let outward = (ray.at(root) - self.center) / self.radius;
        let n = outward.normalize_or_zero();
        // Snap back onto the surface to keep spawned rays from starting inside
        let p = self.center + n * self.radius;

        Some(ShapeHit { t: root, p, n })
    }

    pub fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    /// Uniform point on the surface.
    pub fn sample(&self, u: Vec2) -> ShapeSample {
        let n = uniform_sample_sphere(u);
        ShapeSample {
            p: self.center + self.radius * n,
            n,
        }
    }
}
