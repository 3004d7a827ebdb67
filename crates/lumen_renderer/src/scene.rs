//! Scene: the intersection aggregate plus its lights.

use std::sync::Arc;

use lumen_math::{Bounds3, Ray};

use crate::interaction::Interaction;
use crate::light::{InfiniteLight, Light};
use crate::material::Color;
use crate::primitive::{ClosestHit, Primitive};

pub struct Scene {
    aggregate: Arc<dyn Primitive>,
    lights: Vec<Arc<Light>>,
    /// Index of the environment light in `lights`
    infinite_light: Option<usize>,
    world_bound: Bounds3,
}

impl Scene {
    /// Area lights must be the same `Arc`s held by their primitives.
    pub fn new(aggregate: Arc<dyn Primitive>, lights: Vec<Arc<Light>>) -> Self {
        let world_bound = aggregate.world_bound();
        log::debug!("Scene with {} lights, bounds {:?}", lights.len(), world_bound);
        Self {
            aggregate,
            lights,
            infinite_light: None,
            world_bound,
        }
    }

    /// Surround the scene with constant radiance. Replaces any earlier one.
    pub fn with_environment(mut self, radiance: Color) -> Self {
        if let Some(index) = self.infinite_light.take() {
            log::warn!("Replacing existing environment light");
            self.lights.remove(index);
        }
        let light = InfiniteLight::new(radiance, &self.world_bound);
        self.infinite_light = Some(self.lights.len());
        self.lights.push(Arc::new(Light::Infinite(light)));
        self
    }

    /// Nearest surface hit along `ray`, up to `ray.t_max`.
    pub fn intersect(&self, ray: &Ray) -> Option<Interaction<'_>> {
        let mut hit = ClosestHit::new(ray.t_max);
        self.aggregate.intersect(ray, &mut hit);
        hit.into_interaction()
    }

    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.aggregate.intersect_p(ray)
    }

    pub fn lights(&self) -> &[Arc<Light>] {
        &self.lights
    }

    pub fn infinite_light(&self) -> Option<&Arc<Light>> {
        self.infinite_light.map(|i| &self.lights[i])
    }

    pub fn world_bound(&self) -> Bounds3 {
        self.world_bound
    }
}

/// A pending shadow-ray query between two points.
pub struct VisibilityTester {
    from: Interaction<'static>,
    to: Interaction<'static>,
}

impl VisibilityTester {
    pub fn new(from: Interaction<'static>, to: Interaction<'static>) -> Self {
        Self { from, to }
    }

    /// Whether nothing in `scene` blocks the segment between the two points.
    pub fn unoccluded(&self, scene: &Scene) -> bool {
        !scene.intersect_p(&self.from.spawn_ray_to(&self.to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{GeometricPrimitive, PrimitiveList};
    use crate::sphere::Sphere;
    use lumen_math::Vec3;

    fn blocker_scene() -> Scene {
        let list = PrimitiveList::new(vec![GeometricPrimitive::new(
            Sphere::new(Vec3::new(0.0, 0.0, 2.0), 0.5),
            None,
        )]);
        Scene::new(Arc::new(list), Vec::new())
    }

    #[test]
    fn test_visibility() {
        let scene = blocker_scene();
        let origin = Interaction::new(Vec3::ZERO, Vec3::Z, Vec3::Z);

        let blocked = VisibilityTester::new(origin.detached(), Interaction::point(Vec3::new(0.0, 0.0, 4.0)));
        assert!(!blocked.unoccluded(&scene));

        let short = VisibilityTester::new(origin.detached(), Interaction::point(Vec3::new(0.0, 0.0, 1.0)));
        assert!(short.unoccluded(&scene));

        let aside = VisibilityTester::new(origin.detached(), Interaction::point(Vec3::new(3.0, 0.0, 4.0)));
        assert!(aside.unoccluded(&scene));
    }

    #[test]
    fn test_visibility_to_surface_point() {
        // The target sits on the blocker itself; the segment ends just short of it
        let scene = blocker_scene();
        let origin = Interaction::point(Vec3::ZERO);
        let on_sphere = Interaction::new(Vec3::new(0.0, 0.0, 1.5), -Vec3::Z, -Vec3::Z);
        assert!(VisibilityTester::new(origin, on_sphere).unoccluded(&scene));
    }

    #[test]
    fn test_environment_is_unique() {
        let scene = blocker_scene()
            .with_environment(Color::ONE)
            .with_environment(Color::splat(0.5));
        assert_eq!(scene.lights().len(), 1);

        let env = scene.infinite_light().unwrap();
        assert_eq!(env.le(&Ray::new(Vec3::ZERO, Vec3::X)), Color::splat(0.5));
    }

    #[test]
    fn test_intersect() {
        let scene = blocker_scene();
        let hit = scene.intersect(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert!((hit.p.z - 1.5).abs() < 1e-5);
        assert!(scene.intersect(&Ray::segment(Vec3::ZERO, Vec3::Z, 1.0)).is_none());
        assert!(scene.intersect(&Ray::new(Vec3::ZERO, -Vec3::Z)).is_none());
    }
}
