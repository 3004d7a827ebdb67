//! Triangle shape.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use lumen_core::{Mesh, MeshResult};
use lumen_math::{Bounds3, Interval, Ray, Vec2, Vec3};

use crate::sampling::uniform_sample_triangle;
use crate::shape::{ShapeHit, ShapeSample};

/// Determinant magnitude below which a ray counts as parallel to the triangle.
pub const TRIANGLE_INTERSECT_EPSILON: f32 = 1e-6;

/// A single triangle with optional per-vertex shading normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Unit geometric normal, `normalize(e1 × e2)`
    normal: Vec3,
    vertex_normals: Option<[Vec3; 3]>,
}

impl Triangle {
    /// Create a new triangle from three counter-clockwise vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self {
            v0,
            v1,
            v2,
            normal,
            vertex_normals: None,
        }
    }

    /// Create a triangle that interpolates `normals` for shading.
    pub fn with_normals(v0: Vec3, v1: Vec3, v2: Vec3, normals: [Vec3; 3]) -> Self {
        Self {
            vertex_normals: Some(normals),
            ..Self::new(v0, v1, v2)
        }
    }

    /// Split a validated mesh into triangles.
    pub fn from_mesh(mesh: &Mesh) -> MeshResult<Vec<Triangle>> {
        mesh.validate()?;

        let triangles = (0..mesh.triangle_count())
            .map(|i| {
                let [i0, i1, i2] = mesh.triangle(i);
                let (v0, v1, v2) = (mesh.positions[i0], mesh.positions[i1], mesh.positions[i2]);
                match &mesh.normals {
                    Some(normals) => {
                        Triangle::with_normals(v0, v1, v2, [normals[i0], normals[i1], normals[i2]])
                    }
                    None => Triangle::new(v0, v1, v2),
                }
            })
            .collect();
        Ok(triangles)
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn geometric_normal(&self) -> Vec3 {
        self.normal
    }

    pub fn bounds(&self) -> Bounds3 {
        Bounds3::from_points(self.v0, self.v1).union_point(self.v2)
    }

    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<ShapeHit> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < TRIANGLE_INTERSECT_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        let p = (1.0 - u - v) * self.v0 + u * self.v1 + v * self.v2;
        Some(ShapeHit {
            t,
            p,
            n: self.shading_normal(u, v),
        })
    }

    pub fn area(&self) -> f32 {
        0.5 * (self.v1 - self.v0).cross(self.v2 - self.v0).length()
    }

    /// Uniform point on the surface.
    pub fn sample(&self, u: Vec2) -> ShapeSample {
        let b = uniform_sample_triangle(u);
        let (b1, b2) = (b.y, 1.0 - b.x - b.y);
        ShapeSample {
            p: b.x * self.v0 + b1 * self.v1 + b2 * self.v2,
            n: self.shading_normal(b1, b2),
        }
    }

    /// Interpolated normal at barycentrics `(u, v)` for `v1` and `v2`, falling
    /// back to the geometric normal.
    fn shading_normal(&self, u: f32, v: f32) -> Vec3 {
        match self.vertex_normals {
            Some([n0, n1, n2]) => ((1.0 - u - v) * n0 + u * n1 + v * n2)
                .try_normalize()
                .unwrap_or(self.normal),
            None => self.normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Mat4;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_triangle_hit() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), -Vec3::Z);

        let hit = tri.intersect(&ray, Interval::ray(f32::INFINITY)).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!((hit.p - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-5);
        assert_eq!(hit.n, Vec3::Z);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = unit_triangle();
        let outside = Ray::new(Vec3::new(0.8, 0.8, 1.0), -Vec3::Z);
        let parallel = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::X);
        let behind = Ray::new(Vec3::new(0.2, 0.2, -1.0), -Vec3::Z);

        assert!(tri.intersect(&outside, Interval::ray(f32::INFINITY)).is_none());
        assert!(tri.intersect(&parallel, Interval::ray(f32::INFINITY)).is_none());
        assert!(tri.intersect(&behind, Interval::ray(f32::INFINITY)).is_none());
    }

    #[test]
    fn test_triangle_area_and_sample() {
        let tri = unit_triangle();
        assert!((tri.area() - 0.5).abs() < 1e-6);

        for i in 0..10 {
            let s = tri.sample(Vec2::new(i as f32 / 10.0, 0.3));
            assert!(s.p.x >= -1e-6 && s.p.y >= -1e-6 && s.p.x + s.p.y <= 1.0 + 1e-5);
            assert_eq!(s.p.z, 0.0);
        }
    }

    #[test]
    fn test_from_mesh() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        let mesh = Mesh::new(positions.clone(), vec![0, 1, 2, 1, 3, 2], None);
        let triangles = Triangle::from_mesh(&mesh).unwrap();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1].vertices()[1], Vec3::new(1.0, 1.0, 0.0));

        let broken = Mesh::new(positions, vec![0, 1, 7], None);
        assert!(Triangle::from_mesh(&broken).is_err());
    }

    #[test]
    fn test_vertex_normals_interpolate() {
        let n = Vec3::new(0.0, 1.0, 1.0).normalize();
        let tri = Triangle::with_normals(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            [n, n, n],
        );
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), -Vec3::Z);
        let hit = tri.intersect(&ray, Interval::ray(f32::INFINITY)).unwrap();
        assert!((hit.n - n).length() < 1e-5);
        assert_eq!(tri.geometric_normal(), Vec3::Z);
    }

    #[test]
    fn test_from_transformed_mesh() {
        // Unit quad facing +z, turned to face +x and moved to x = 2
        let quad = Mesh::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
            Some(vec![Vec3::Z; 4]),
        );
        let object_to_world = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let triangles = Triangle::from_mesh(&quad.transformed(&object_to_world)).unwrap();

        let ray = Ray::new(Vec3::new(0.0, 0.3, -0.5), Vec3::X);
        let hit = triangles
            .iter()
            .find_map(|tri| tri.intersect(&ray, Interval::ray(f32::INFINITY)))
            .unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.p - Vec3::new(2.0, 0.3, -0.5)).length() < 1e-5);
        assert!((hit.n - Vec3::X).length() < 1e-5);
        for tri in &triangles {
            assert!((tri.geometric_normal() - Vec3::X).length() < 1e-5);
        }

        // The untransformed footprint is now empty
        let old = Ray::new(Vec3::new(0.3, 0.3, 5.0), -Vec3::Z);
        assert!(triangles
            .iter()
            .all(|tri| tri.intersect(&old, Interval::ray(f32::INFINITY)).is_none()));
    }
}
