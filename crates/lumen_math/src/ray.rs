use crate::Vec3;

/// A ray with an origin, a direction and a maximum parameter.
///
/// The direction is not required to be normalized. Shadow rays toward a point
/// use the unnormalized offset so that `t_max` slightly below 1 stops just short
/// of the target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub t_max: f32,
}

impl Ray {
    /// Create a ray with an unbounded parametric range.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            t_max: f32::INFINITY,
        }
    }

    /// Create a ray that ends at parameter `t_max`.
    pub fn segment(origin: Vec3, direction: Vec3, t_max: f32) -> Self {
        Self {
            origin,
            direction,
            t_max,
        }
    }

    /// Returns `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Per-axis reciprocal of the direction. Zero components become ±infinity.
    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        Vec3::new(
            1.0 / self.direction.x,
            1.0 / self.direction.y,
            1.0 / self.direction.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(ray.t_max, f32::INFINITY);
    }

    #[test]
    fn test_ray_segment() {
        let ray = Ray::segment(Vec3::ONE, Vec3::new(0.0, 0.0, 4.0), 0.9999);
        assert_eq!(ray.t_max, 0.9999);
        assert!((ray.at(ray.t_max).z - 4.9996).abs() < 1e-4);
    }

    #[test]
    fn test_inv_direction_signed_zero() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, -0.0, 2.0));
        let inv = ray.inv_direction();

        assert_eq!(inv.x, f32::INFINITY);
        assert_eq!(inv.y, f32::NEG_INFINITY);
        assert_eq!(inv.z, 0.5);
    }
}
