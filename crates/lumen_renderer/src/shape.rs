//! Closed set of geometric shapes.
//!
//! Shapes know only geometry. Materials and emission are attached one level up
//! by [`GeometricPrimitive`](crate::GeometricPrimitive).

use lumen_math::{Bounds3, Interval, Ray, Vec2, Vec3};

use crate::interaction::Interaction;
use crate::sphere::Sphere;
use crate::triangle::Triangle;

/// Surface hit found by a shape: ray parameter, position and unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    pub t: f32,
    pub p: Vec3,
    pub n: Vec3,
}

/// A point sampled on a shape's surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSample {
    pub p: Vec3,
    pub n: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Shape {
    pub fn bounds(&self) -> Bounds3 {
        match self {
            Shape::Sphere(s) => s.bounds(),
            Shape::Triangle(t) => t.bounds(),
        }
    }

    /// Nearest hit with `t` strictly inside `ray_t`.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<ShapeHit> {
        match self {
            Shape::Sphere(s) => s.intersect(ray, ray_t),
            Shape::Triangle(t) => t.intersect(ray, ray_t),
        }
    }

    /// Whether any hit lies in `(0, ray.t_max)`.
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.intersect(ray, Interval::ray(ray.t_max)).is_some()
    }

    pub fn area(&self) -> f32 {
        match self {
            Shape::Sphere(s) => s.area(),
            Shape::Triangle(t) => t.area(),
        }
    }

    /// Point sampled uniformly by area; its density is `1 / area`.
    pub fn sample(&self, u: Vec2) -> ShapeSample {
        match self {
            Shape::Sphere(s) => s.sample(u),
            Shape::Triangle(t) => t.sample(u),
        }
    }

    /// Sample a point as seen from `reference` and return it with its density
    /// converted to solid angle. `None` when the conversion is degenerate.
    pub fn sample_from(&self, reference: &Interaction, u: Vec2) -> Option<(ShapeSample, f32)> {
        let sample = self.sample(u);
        let to_sample = sample.p - reference.p;
        let dist_sq = to_sample.length_squared();
        if dist_sq == 0.0 {
            return None;
        }

        let wi = to_sample / dist_sq.sqrt();
        let cos = sample.n.dot(-wi).abs();
        if cos == 0.0 {
            return None;
        }

        let pdf = dist_sq / (cos * self.area());
        pdf.is_finite().then_some((sample, pdf))
    }

    /// Solid-angle density of sampling direction `wi` from `reference` with
    /// [`Shape::sample_from`]. Zero when the direction misses the shape.
    pub fn pdf_from(&self, reference: &Interaction, wi: Vec3) -> f32 {
        let ray = reference.spawn_ray(wi);
        let Some(hit) = self.intersect(&ray, Interval::ray(f32::INFINITY)) else {
            return 0.0;
        };

        let cos = hit.n.dot(-wi).abs();
        if cos == 0.0 {
            return 0.0;
        }

        let pdf = reference.p.distance_squared(hit.p) / (cos * self.area());
        if pdf.is_finite() {
            pdf
        } else {
            0.0
        }
    }
}

impl From<Sphere> for Shape {
    fn from(sphere: Sphere) -> Self {
        Shape::Sphere(sphere)
    }
}

impl From<Triangle> for Shape {
    fn from(triangle: Triangle) -> Self {
        Shape::Triangle(triangle)
    }
}
