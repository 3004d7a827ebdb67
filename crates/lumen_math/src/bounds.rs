use crate::{Ray, Vec3};

/// Conservative rounding bound `n·ε / (1 - n·ε)` for `n` floating-point operations.
#[inline]
pub fn gamma(n: u32) -> f32 {
    let e = f32::EPSILON * 0.5 * n as f32;
    e / (1.0 - e)
}

/// Axis-aligned bounding box.
///
/// An empty box stores `min = +inf, max = -inf` so that it is the identity for
/// [`Bounds3::union`] and [`Bounds3::union_point`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds3 {
    pub const EMPTY: Bounds3 = Bounds3 {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// A degenerate box containing a single point.
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Box spanned by two arbitrary corners.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn union(&self, other: &Bounds3) -> Bounds3 {
        Bounds3 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn union_point(&self, p: Vec3) -> Bounds3 {
        Bounds3 {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    /// Surface area; zero for empty boxes.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Index (0=X, 1=Y, 2=Z) of the axis with the largest extent.
    pub fn max_extent(&self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Position of `p` relative to the box corners; 0 at `min`, 1 at `max`.
    pub fn offset(&self, p: Vec3) -> Vec3 {
        let mut o = p - self.min;
        for axis in 0..3 {
            if self.max[axis] > self.min[axis] {
                o[axis] /= self.max[axis] - self.min[axis];
            }
        }
        o
    }

    pub fn inside(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Center and radius of a sphere enclosing the box.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        if self.is_empty() {
            return (Vec3::ZERO, 0.0);
        }
        let center = self.centroid();
        (center, center.distance(self.max))
    }

    #[inline]
    fn corner(&self, upper: usize) -> Vec3 {
        if upper == 0 {
            self.min
        } else {
            self.max
        }
    }

    /// Slab test against `ray` restricted to the parametric range `(0, t_max)`.
    ///
    /// `inv_dir` and `dir_is_neg` are computed once per ray. Far distances are
    /// scaled by `1 + 2γ(3)` so rounding never produces a false miss, and
    /// `0 · ∞ = NaN` slab distances (origin on a slab plane with a zero direction
    /// component) are absorbed by the NaN-ignoring `min`/`max` merges.
    #[inline]
    pub fn intersect_p(&self, ray: &Ray, t_max: f32, inv_dir: Vec3, dir_is_neg: [usize; 3]) -> bool {
        let o = ray.origin;
        let scale = 1.0 + 2.0 * gamma(3);

        let mut t0 = (self.corner(dir_is_neg[0]).x - o.x) * inv_dir.x;
        let mut t1 = (self.corner(1 - dir_is_neg[0]).x - o.x) * inv_dir.x * scale;

        let ty0 = (self.corner(dir_is_neg[1]).y - o.y) * inv_dir.y;
        let ty1 = (self.corner(1 - dir_is_neg[1]).y - o.y) * inv_dir.y * scale;
        if t0 > ty1 || ty0 > t1 {
            return false;
        }
        t0 = t0.max(ty0);
        t1 = t1.min(ty1);

        let tz0 = (self.corner(dir_is_neg[2]).z - o.z) * inv_dir.z;
        let tz1 = (self.corner(1 - dir_is_neg[2]).z - o.z) * inv_dir.z * scale;
        if t0 > tz1 || tz0 > t1 {
            return false;
        }
        t0 = t0.max(tz0);
        t1 = t1.min(tz1);

        t0 < t_max && t1 > 0.0
    }
}

/// Per-axis sign of a direction as corner selectors for [`Bounds3::intersect_p`].
#[inline]
pub fn dir_is_neg(inv_dir: Vec3) -> [usize; 3] {
    [
        (inv_dir.x < 0.0) as usize,
        (inv_dir.y < 0.0) as usize,
        (inv_dir.z < 0.0) as usize,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Bounds3 {
        Bounds3::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    fn hits(b: &Bounds3, ray: &Ray) -> bool {
        let inv = ray.inv_direction();
        b.intersect_p(ray, ray.t_max, inv, dir_is_neg(inv))
    }

    #[test]
    fn test_empty_is_union_identity() {
        let b = unit_box();
        assert!(Bounds3::EMPTY.is_empty());
        assert_eq!(Bounds3::EMPTY.union(&b), b);
        assert_eq!(Bounds3::EMPTY.union_point(Vec3::ONE), Bounds3::from_point(Vec3::ONE));
        assert_eq!(Bounds3::EMPTY.surface_area(), 0.0);
    }

    #[test]
    fn test_union_idempotent() {
        let b = Bounds3::from_points(Vec3::new(-2.0, 0.5, 1.0), Vec3::new(3.0, 4.0, 1.5));
        assert_eq!(b.union(&b), b);
        assert_eq!(b.union_point(b.centroid()), b);
        assert_eq!(b.union_point(b.min), b);
        assert_eq!(b.union_point(b.max), b);
    }

    #[test]
    fn test_surface_area_and_extent() {
        let b = Bounds3::from_points(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.surface_area(), 2.0 * (2.0 + 3.0 + 6.0));
        assert_eq!(b.max_extent(), 2);

        let flat = Bounds3::from_points(Vec3::ZERO, Vec3::new(4.0, 1.0, 0.0));
        assert_eq!(flat.max_extent(), 0);
        assert_eq!(flat.surface_area(), 8.0);
    }

    #[test]
    fn test_offset_and_inside() {
        let b = Bounds3::from_points(Vec3::ZERO, Vec3::new(2.0, 4.0, 0.0));
        assert_eq!(b.offset(Vec3::new(1.0, 1.0, 0.0)), Vec3::new(0.5, 0.25, 0.0));
        assert!(b.inside(Vec3::new(2.0, 4.0, 0.0)));
        assert!(!b.inside(Vec3::new(2.1, 1.0, 0.0)));
    }

    #[test]
    fn test_bounding_sphere() {
        let (center, radius) = unit_box().bounding_sphere();
        assert_eq!(center, Vec3::ZERO);
        assert!((radius - 3.0f32.sqrt()).abs() < 1e-6);
        assert_eq!(Bounds3::EMPTY.bounding_sphere().1, 0.0);
    }

    #[test]
    fn test_slab_hit_and_miss() {
        let b = unit_box();

        assert!(hits(&b, &Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z)));
        assert!(!hits(&b, &Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z)));
        assert!(!hits(&b, &Ray::new(Vec3::new(3.0, 0.0, -5.0), Vec3::Z)));
        // Origin inside the box
        assert!(hits(&b, &Ray::new(Vec3::ZERO, Vec3::new(0.3, -0.2, 0.9))));
        // Box lies beyond t_max
        assert!(!hits(&b, &Ray::segment(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 3.5)));
    }

    #[test]
    fn test_slab_axis_aligned_boundaries() {
        let b = unit_box();

        // Ray grazing the +x face with a zero x direction component
        let graze = Ray::new(Vec3::new(1.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(hits(&b, &graze));

        // Same with a negative zero component
        let graze_neg = Ray::new(Vec3::new(-1.0, 0.0, -5.0), Vec3::new(-0.0, 0.0, 1.0));
        assert!(hits(&b, &graze_neg));

        // Parallel but outside the slab
        let outside = Ray::new(Vec3::new(1.001, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!hits(&b, &outside));
    }

    #[test]
    fn test_slab_flat_box() {
        // Triangles in the z=0 plane produce zero-thickness boxes
        let b = Bounds3::from_points(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        assert!(hits(&b, &Ray::new(Vec3::new(0.2, 0.1, 3.0), -Vec3::Z)));
        assert!(hits(&b, &Ray::new(Vec3::new(0.2, 0.1, -3.0), Vec3::new(0.01, 0.0, 1.0))));
    }

    #[test]
    fn test_dir_is_neg() {
        let inv = Ray::new(Vec3::ZERO, Vec3::new(-1.0, 2.0, -0.0)).inv_direction();
        assert_eq!(dir_is_neg(inv), [1, 0, 1]);
    }
}
