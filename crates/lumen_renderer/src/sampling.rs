//! Sample warping functions, the MIS power heuristic and the alias-method
//! discrete distribution.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use lumen_math::{Vec2, Vec3};

/// Density of [`uniform_sample_sphere`] with respect to solid angle.
pub const UNIFORM_SPHERE_PDF: f32 = 1.0 / (4.0 * PI);

/// Map the unit square onto the unit disk preserving relative areas.
pub fn concentric_sample_disk(u: Vec2) -> Vec2 {
    let offset = 2.0 * u - Vec2::ONE;
    if offset.x == 0.0 && offset.y == 0.0 {
        return Vec2::ZERO;
    }

    let (r, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, FRAC_PI_4 * (offset.y / offset.x))
    } else {
        (offset.y, FRAC_PI_2 - FRAC_PI_4 * (offset.x / offset.y))
    };
    r * Vec2::new(theta.cos(), theta.sin())
}

/// Cosine-weighted direction on the +z hemisphere (Malley's method).
pub fn cosine_sample_hemisphere(u: Vec2) -> Vec3 {
    let d = concentric_sample_disk(u);
    let z = (1.0 - d.x * d.x - d.y * d.y).max(0.0).sqrt();
    Vec3::new(d.x, d.y, z)
}

pub fn uniform_sample_sphere(u: Vec2) -> Vec3 {
    let z = 1.0 - 2.0 * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniform barycentric coordinates `(b0, b1)` over a triangle.
pub fn uniform_sample_triangle(u: Vec2) -> Vec2 {
    let su0 = u.x.sqrt();
    Vec2::new(1.0 - su0, u.y * su0)
}

/// Power heuristic with β = 2 for one sample from each strategy:
/// `a² / (a² + b²)`.
#[inline]
pub fn power_heuristic(pdf_a: f32, pdf_b: f32) -> f32 {
    let a = pdf_a * pdf_a;
    let b = pdf_b * pdf_b;
    if a.is_infinite() {
        return 1.0;
    }
    if a + b == 0.0 {
        return 0.0;
    }
    a / (a + b)
}

/// Piecewise-constant 1D distribution sampled in O(1) with Walker's alias method.
#[derive(Debug, Clone)]
pub struct Distribution1D {
    /// Normalized probabilities, summing to 1.
    pdf: Vec<f32>,
    /// Probability of keeping each slot rather than jumping to its alias.
    threshold: Vec<f32>,
    alias: Vec<usize>,
}

impl Distribution1D {
    /// Build from non-negative weights. All-zero weights become uniform.
    ///
    /// # Panics
    ///
    /// Panics if `weights` is empty.
    pub fn new(weights: &[f32]) -> Self {
        assert!(!weights.is_empty(), "Distribution1D needs at least one weight");
        let n = weights.len();

        let sum: f32 = weights.iter().map(|w| w.max(0.0)).sum();
        let pdf: Vec<f32> = if sum > 0.0 {
            weights.iter().map(|w| w.max(0.0) / sum).collect()
        } else {
            vec![1.0 / n as f32; n]
        };

        let mut threshold: Vec<f32> = pdf.iter().map(|p| p * n as f32).collect();
        let mut alias: Vec<usize> = (0..n).collect();

        let mut small = Vec::new();
        let mut large = Vec::new();
        for (i, &t) in threshold.iter().enumerate() {
            if t < 1.0 {
                small.push(i);
            } else {
                large.push(i);
            }
        }

        while let (Some(&s), Some(&l)) = (small.last(), large.last()) {
            small.pop();
            alias[s] = l;
            threshold[l] = (threshold[l] + threshold[s]) - 1.0;
            if threshold[l] < 1.0 {
                large.pop();
                small.push(l);
            }
        }

        // Rounding leftovers always keep their own slot
        for i in small.into_iter().chain(large) {
            threshold[i] = 1.0;
        }

        Self {
            pdf,
            threshold,
            alias,
        }
    }

    pub fn count(&self) -> usize {
        self.pdf.len()
    }

    pub fn discrete_pdf(&self, index: usize) -> f32 {
        self.pdf[index]
    }

    /// Pick a slot for `u ∈ [0, 1)`. Returns the index and its probability.
    pub fn sample_discrete(&self, u: f32) -> (usize, f32) {
        let (slot, remapped) = self.split(u);
        let index = if remapped < self.threshold[slot] {
            slot
        } else {
            self.alias[slot]
        };
        (index, self.pdf[index])
    }

    /// Sample a continuous value in `[0, 1)`. Returns the value, its density and
    /// the slot it falls in.
    pub fn sample_continuous(&self, u: f32) -> (f32, f32, usize) {
        let n = self.count();
        let (slot, remapped) = self.split(u);
        let t = self.threshold[slot];

        let (index, offset) = if remapped < t {
            (slot, remapped / t)
        } else {
            (self.alias[slot], (remapped - t) / (1.0 - t))
        };

        let x = (index as f32 + offset.min(1.0 - f32::EPSILON)) / n as f32;
        (x, self.pdf[index] * n as f32, index)
    }

    fn split(&self, u: f32) -> (usize, f32) {
        let n = self.count();
        let scaled = u * n as f32;
        let slot = (scaled as usize).min(n - 1);
        (slot, (scaled - slot as f32).clamp(0.0, 1.0))
    }
}
