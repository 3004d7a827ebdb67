use crate::Vec3;

/// Orthonormal shading basis `(s, t, n)` around a surface normal.
///
/// Local directions have the normal along +z, so `cos θ` is simply `w.z`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadingFrame {
    pub s: Vec3,
    pub t: Vec3,
    pub n: Vec3,
}

impl ShadingFrame {
    /// Build a basis from a unit normal.
    pub fn from_normal(n: Vec3) -> Self {
        let (s, t) = n.any_orthonormal_pair();
        Self { s, t, n }
    }

    pub fn to_local(&self, w: Vec3) -> Vec3 {
        Vec3::new(w.dot(self.s), w.dot(self.t), w.dot(self.n))
    }

    pub fn to_world(&self, w: Vec3) -> Vec3 {
        self.s * w.x + self.t * w.y + self.n * w.z
    }

    #[inline]
    pub fn cos_theta(w: Vec3) -> f32 {
        w.z
    }

    #[inline]
    pub fn abs_cos_theta(w: Vec3) -> f32 {
        w.z.abs()
    }

    #[inline]
    pub fn same_hemisphere(a: Vec3, b: Vec3) -> bool {
        a.z * b.z > 0.0
    }
}
