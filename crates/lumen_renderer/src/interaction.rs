//! Surface interaction records and ray spawning.

use std::sync::Arc;

use lumen_math::{Ray, Vec3};

use crate::bsdf::Bsdf;
use crate::light::Light;
use crate::material::Color;
use crate::primitive::Primitive;

/// Distance along the normal by which spawned ray origins are pushed off a surface.
pub const RAY_ORIGIN_OFFSET_EPSILON: f32 = 1e-4;

/// Shadow rays toward a point stop at `1 - SHADOW_EPSILON` of the way there.
pub const SHADOW_EPSILON: f32 = 1e-4;

/// A point on a surface (or a bare point in space when `n` is zero).
///
/// Borrows the primitive it was found on for the lifetime of the scene query.
#[derive(Clone)]
pub struct Interaction<'a> {
    pub p: Vec3,
    /// Unit surface normal, or zero for points not on a surface
    pub n: Vec3,
    /// Unit direction back toward the ray origin
    pub wo: Vec3,
    pub bsdf: Option<Bsdf>,
    pub primitive: Option<&'a dyn Primitive>,
}

impl<'a> Interaction<'a> {
    pub fn new(p: Vec3, n: Vec3, wo: Vec3) -> Self {
        Self {
            p,
            n,
            wo,
            bsdf: None,
            primitive: None,
        }
    }

    /// A point with no surface; rays leave it without offset.
    pub fn point(p: Vec3) -> Self {
        Self::new(p, Vec3::ZERO, Vec3::ZERO)
    }

    /// Copy of the geometry only, detached from the scene.
    pub fn detached(&self) -> Interaction<'static> {
        Interaction::new(self.p, self.n, self.wo)
    }

    pub fn is_surface(&self) -> bool {
        self.n != Vec3::ZERO
    }

    /// Origin for a ray leaving toward `w`, pushed to the side of the surface `w` points into.
    pub fn offset_origin(&self, w: Vec3) -> Vec3 {
        let offset = self.n * RAY_ORIGIN_OFFSET_EPSILON;
        if w.dot(self.n) < 0.0 {
            self.p - offset
        } else {
            self.p + offset
        }
    }

    pub fn spawn_ray(&self, w: Vec3) -> Ray {
        Ray::new(self.offset_origin(w), w)
    }

    /// Segment toward `target` that stops just short of it.
    pub fn spawn_ray_to(&self, target: &Interaction) -> Ray {
        let origin = self.offset_origin(target.p - self.p);
        let end = target.offset_origin(origin - target.p);
        Ray::segment(origin, end - origin, 1.0 - SHADOW_EPSILON)
    }

    /// The area light attached to the primitive that was hit, if any.
    pub fn area_light(&self) -> Option<&'a Arc<Light>> {
        self.primitive.and_then(|p| p.area_light())
    }

    /// Radiance emitted from this point toward `w`.
    pub fn le(&self, w: Vec3) -> Color {
        match self.area_light() {
            Some(light) => light.l(self, w),
            None => Color::ZERO,
        }
    }

    /// Evaluate the hit primitive's material into `self.bsdf`. Leaves it `None`
    /// for surfaces that do not scatter.
    pub fn compute_scattering_functions(&mut self) {
        self.bsdf = self
            .primitive
            .and_then(|p| p.material())
            .and_then(|material| material.compute_bsdf(self.n));
    }
}
