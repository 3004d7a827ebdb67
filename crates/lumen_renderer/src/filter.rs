//! Separable pixel reconstruction filters.

use serde::{Deserialize, Serialize};

/// Entries in a tabulated 1D filter over `[0, radius)`.
pub const FILTER_TABLE_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    Box { radius: f32 },
    Triangle { radius: f32 },
    Gaussian { radius: f32, alpha: f32 },
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Box { radius: 0.5 }
    }
}

impl Filter {
    pub fn radius(&self) -> f32 {
        match *self {
            Filter::Box { radius } | Filter::Triangle { radius } | Filter::Gaussian { radius, .. } => {
                radius
            }
        }
    }

    /// 1D filter value at offset `x` from the pixel center.
    pub fn evaluate(&self, x: f32) -> f32 {
        let x = x.abs();
        match *self {
            Filter::Box { radius } => {
                if x <= radius {
                    1.0
                } else {
                    0.0
                }
            }
            Filter::Triangle { radius } => (radius - x).max(0.0),
            Filter::Gaussian { radius, alpha } => {
                ((-alpha * x * x).exp() - (-alpha * radius * radius).exp()).max(0.0)
            }
        }
    }

    /// Filter values at the midpoints of `FILTER_TABLE_WIDTH` equal steps over `[0, radius)`.
    pub fn tabulate(&self) -> [f32; FILTER_TABLE_WIDTH] {
        let step = self.radius() / FILTER_TABLE_WIDTH as f32;
        std::array::from_fn(|i| self.evaluate((i as f32 + 0.5) * step))
    }
}
