//! Primitive capability trait and its leaf and brute-force implementations.

use std::sync::Arc;

use lumen_math::{Bounds3, Interval, Ray};

use crate::interaction::Interaction;
use crate::light::{DiffuseAreaLight, Light};
use crate::material::{Color, Material};
use crate::shape::Shape;

/// Best hit found so far during a nearest-hit query.
///
/// Traversal narrows `t_max` as closer hits are recorded; the query ray itself
/// is never modified.
pub struct ClosestHit<'a> {
    t_max: f32,
    interaction: Option<Interaction<'a>>,
}

impl<'a> ClosestHit<'a> {
    pub fn new(t_max: f32) -> Self {
        Self {
            t_max,
            interaction: None,
        }
    }

    pub fn t_max(&self) -> f32 {
        self.t_max
    }

    /// Parameter range a new hit must fall in to be closer.
    pub fn range(&self) -> Interval {
        Interval::ray(self.t_max)
    }

    pub fn record(&mut self, t: f32, interaction: Interaction<'a>) {
        self.t_max = t;
        self.interaction = Some(interaction);
    }

    pub fn is_hit(&self) -> bool {
        self.interaction.is_some()
    }

    pub fn into_interaction(self) -> Option<Interaction<'a>> {
        self.interaction
    }
}

/// Something a ray can hit: a single shape or an aggregate of them.
pub trait Primitive: Send + Sync {
    fn world_bound(&self) -> Bounds3;

    /// Record the nearest hit closer than `hit.t_max()`. Returns whether one
    /// was recorded.
    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut ClosestHit<'a>) -> bool;

    /// Whether anything is hit in `(0, ray.t_max)`.
    fn intersect_p(&self, ray: &Ray) -> bool;

    fn material(&self) -> Option<&Material> {
        None
    }

    fn area_light(&self) -> Option<&Arc<Light>> {
        None
    }
}

/// A shape with an optional material and an optional area light.
#[derive(Debug, Clone)]
pub struct GeometricPrimitive {
    shape: Arc<Shape>,
    material: Option<Material>,
    area_light: Option<Arc<Light>>,
}

impl GeometricPrimitive {
    /// A primitive that does not emit. `None` for `material` gives a surface
    /// that ends paths.
    pub fn new(shape: impl Into<Shape>, material: Option<Material>) -> Self {
        Self {
            shape: Arc::new(shape.into()),
            material,
            area_light: None,
        }
    }

    /// An emitting primitive together with its area light. Both share one
    /// shape instance; pass the light to the scene's light list.
    pub fn emissive(
        shape: impl Into<Shape>,
        material: Option<Material>,
        radiance: Color,
        two_sided: bool,
    ) -> (Self, Arc<Light>) {
        let shape = Arc::new(shape.into());
        let light = Arc::new(Light::DiffuseArea(DiffuseAreaLight::new(
            shape.clone(),
            radiance,
            two_sided,
        )));
        let primitive = Self {
            shape,
            material,
            area_light: Some(light.clone()),
        };
        (primitive, light)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

impl Primitive for GeometricPrimitive {
    fn world_bound(&self) -> Bounds3 {
        self.shape.bounds()
    }

    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut ClosestHit<'a>) -> bool {
        let Some(shape_hit) = self.shape.intersect(ray, hit.range()) else {
            return false;
        };

        let mut interaction = Interaction::new(shape_hit.p, shape_hit.n, -ray.direction.normalize());
        interaction.primitive = Some(self);
        hit.record(shape_hit.t, interaction);
        true
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        self.shape.intersect_p(ray)
    }

    fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    fn area_light(&self) -> Option<&Arc<Light>> {
        self.area_light.as_ref()
    }
}

/// Linear list of primitives tested one by one.
///
/// The reference answer for BVH queries, and the aggregate for scenes too
/// small (or empty) to be worth a hierarchy.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveList {
    primitives: Vec<GeometricPrimitive>,
    bounds: Bounds3,
}

impl PrimitiveList {
    pub fn new(primitives: Vec<GeometricPrimitive>) -> Self {
        let bounds = primitives
            .iter()
            .fold(Bounds3::EMPTY, |b, p| b.union(&p.world_bound()));
        Self { primitives, bounds }
    }

    pub fn add(&mut self, primitive: GeometricPrimitive) {
        self.bounds = self.bounds.union(&primitive.world_bound());
        self.primitives.push(primitive);
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl Primitive for PrimitiveList {
    fn world_bound(&self) -> Bounds3 {
        self.bounds
    }

    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut ClosestHit<'a>) -> bool {
        let mut hit_anything = false;
        for primitive in &self.primitives {
            if primitive.intersect(ray, hit) {
                hit_anything = true;
            }
        }
        hit_anything
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        self.primitives.iter().any(|p| p.intersect_p(ray))
    }
}
