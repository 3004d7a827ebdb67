//! BxDFs in the local shading frame and the world-space BSDF wrapper.
//!
//! Local directions have the shading normal along +z. Specular lobes are
//! Dirac deltas: their `f` and `pdf` evaluate to zero, and only `sample_f`
//! returns them, with a pdf of 1 for the chosen event.

use std::f32::consts::FRAC_1_PI;

use bitflags::bitflags;
use lumen_math::{ShadingFrame, Vec2, Vec3};

use crate::material::Color;
use crate::sampling::cosine_sample_hemisphere;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BxdfType: u8 {
        const REFLECTION = 1 << 0;
        const TRANSMISSION = 1 << 1;
        const DIFFUSE = 1 << 2;
        const GLOSSY = 1 << 3;
        const SPECULAR = 1 << 4;
    }
}

/// Fresnel reflectance for a dielectric interface.
///
/// `cos_theta_i` is relative to a normal on the `eta_i` side; a negative value
/// means the incident direction is on the `eta_t` side and the media swap.
pub fn fr_dielectric(cos_theta_i: f32, eta_i: f32, eta_t: f32) -> f32 {
    let mut cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
    let (mut eta_i, mut eta_t) = (eta_i, eta_t);
    if cos_theta_i <= 0.0 {
        std::mem::swap(&mut eta_i, &mut eta_t);
        cos_theta_i = cos_theta_i.abs();
    }

    let sin_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0).sqrt();
    let sin_theta_t = eta_i / eta_t * sin_theta_i;
    if sin_theta_t >= 1.0 {
        // Total internal reflection
        return 1.0;
    }
    let cos_theta_t = (1.0 - sin_theta_t * sin_theta_t).max(0.0).sqrt();

    let r_parl = ((eta_t * cos_theta_i) - (eta_i * cos_theta_t))
        / ((eta_t * cos_theta_i) + (eta_i * cos_theta_t));
    let r_perp = ((eta_i * cos_theta_i) - (eta_t * cos_theta_t))
        / ((eta_i * cos_theta_i) + (eta_t * cos_theta_t));
    (r_parl * r_parl + r_perp * r_perp) / 2.0
}

/// Refract `wi` through the surface with normal `n` (on the same side as `wi`),
/// where `eta` is the ratio `eta_i / eta_t`. `None` on total internal reflection.
pub fn refract(wi: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let cos_theta_i = n.dot(wi);
    let sin2_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0);
    let sin2_theta_t = eta * eta * sin2_theta_i;
    if sin2_theta_t >= 1.0 {
        return None;
    }
    let cos_theta_t = (1.0 - sin2_theta_t).sqrt();
    Some(eta * -wi + (eta * cos_theta_i - cos_theta_t) * n)
}

/// `n` flipped into the hemisphere of `v`.
pub fn face_forward(n: Vec3, v: Vec3) -> Vec3 {
    if n.dot(v) < 0.0 {
        -n
    } else {
        n
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fresnel {
    /// Reflects everything.
    NoOp,
    Dielectric { eta_i: f32, eta_t: f32 },
}

impl Fresnel {
    pub fn evaluate(&self, cos_theta_i: f32) -> Color {
        match *self {
            Fresnel::NoOp => Color::ONE,
            Fresnel::Dielectric { eta_i, eta_t } => Color::splat(fr_dielectric(cos_theta_i, eta_i, eta_t)),
        }
    }
}

/// Outcome of sampling a scattering direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BxdfSample {
    pub f: Color,
    pub wi: Vec3,
    pub pdf: f32,
    pub sampled_type: BxdfType,
    /// `(η_t / η_i)²` for a refraction, 1 otherwise. The integrator multiplies it
    /// into the throughput it feeds to Russian roulette, undoing the radiance
    /// compression already baked into `f`.
    pub eta_scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bxdf {
    LambertianReflection { r: Color },
    SpecularReflection { r: Color, fresnel: Fresnel },
    /// Specular reflection and transmission chosen stochastically by Fresnel weight.
    FresnelSpecular {
        r: Color,
        t: Color,
        /// Index of refraction on the side the normal points away from.
        eta_a: f32,
        /// Index of refraction on the side the normal points into.
        eta_b: f32,
    },
}

impl Bxdf {
    pub fn flags(&self) -> BxdfType {
        match self {
            Bxdf::LambertianReflection { .. } => BxdfType::REFLECTION | BxdfType::DIFFUSE,
            Bxdf::SpecularReflection { .. } => BxdfType::REFLECTION | BxdfType::SPECULAR,
            Bxdf::FresnelSpecular { .. } => {
                BxdfType::REFLECTION | BxdfType::TRANSMISSION | BxdfType::SPECULAR
            }
        }
    }

    pub fn f(&self, wo: Vec3, wi: Vec3) -> Color {
        match *self {
            Bxdf::LambertianReflection { r } if ShadingFrame::same_hemisphere(wo, wi) => r * FRAC_1_PI,
            _ => Color::ZERO,
        }
    }

    pub fn pdf(&self, wo: Vec3, wi: Vec3) -> f32 {
        match self {
            Bxdf::LambertianReflection { .. } if ShadingFrame::same_hemisphere(wo, wi) => {
                ShadingFrame::abs_cos_theta(wi) * FRAC_1_PI
            }
            _ => 0.0,
        }
    }

    pub fn sample_f(&self, wo: Vec3, u: Vec2) -> Option<BxdfSample> {
        match *self {
            Bxdf::LambertianReflection { r } => {
                let mut wi = cosine_sample_hemisphere(u);
                if wo.z < 0.0 {
                    wi.z = -wi.z;
                }
                let pdf = self.pdf(wo, wi);
                if pdf == 0.0 {
                    return None;
                }
                Some(BxdfSample {
                    f: r * FRAC_1_PI,
                    wi,
                    pdf,
                    sampled_type: self.flags(),
                    eta_scale: 1.0,
                })
            }
            Bxdf::SpecularReflection { r, fresnel } => {
                let wi = Vec3::new(-wo.x, -wo.y, wo.z);
                let cos = ShadingFrame::abs_cos_theta(wi);
                if cos == 0.0 {
                    return None;
                }
                Some(BxdfSample {
                    f: fresnel.evaluate(ShadingFrame::cos_theta(wi)) * r / cos,
                    wi,
                    pdf: 1.0,
                    sampled_type: BxdfType::REFLECTION | BxdfType::SPECULAR,
                    eta_scale: 1.0,
                })
            }
            Bxdf::FresnelSpecular { r, t, eta_a, eta_b } => {
                let cos_o = ShadingFrame::cos_theta(wo);
                if cos_o == 0.0 {
                    return None;
                }
                let fr = fr_dielectric(cos_o, eta_a, eta_b);

                if u.x < fr {
                    let wi = Vec3::new(-wo.x, -wo.y, wo.z);
                    Some(BxdfSample {
                        f: fr * r / ShadingFrame::abs_cos_theta(wi),
                        wi,
                        pdf: fr,
                        sampled_type: BxdfType::REFLECTION | BxdfType::SPECULAR,
                        eta_scale: 1.0,
                    })
                } else {
                    let entering = cos_o > 0.0;
                    let (eta_i, eta_t) = if entering { (eta_a, eta_b) } else { (eta_b, eta_a) };
                    let wi = refract(wo, face_forward(Vec3::Z, wo), eta_i / eta_t)?;
                    let cos_i = ShadingFrame::abs_cos_theta(wi);
                    if cos_i == 0.0 {
                        return None;
                    }

                    // Radiance is compressed by (η_i / η_t)² crossing the interface
                    let compression = (eta_i * eta_i) / (eta_t * eta_t);
                    Some(BxdfSample {
                        f: t * (1.0 - fr) * compression / cos_i,
                        wi,
                        pdf: 1.0 - fr,
                        sampled_type: BxdfType::TRANSMISSION | BxdfType::SPECULAR,
                        eta_scale: 1.0 / compression,
                    })
                }
            }
        }
    }
}

/// A BxDF placed in world space at a surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bsdf {
    frame: ShadingFrame,
    /// Geometric normal, used to tell reflection from transmission.
    ng: Vec3,
    bxdf: Bxdf,
}

impl Bsdf {
    pub fn new(n: Vec3, bxdf: Bxdf) -> Self {
        Self {
            frame: ShadingFrame::from_normal(n),
            ng: n,
            bxdf,
        }
    }

    pub fn flags(&self) -> BxdfType {
        self.bxdf.flags()
    }

    pub fn is_specular(&self) -> bool {
        self.flags().contains(BxdfType::SPECULAR)
    }

    /// Evaluate for world-space directions.
    pub fn f(&self, wo_world: Vec3, wi_world: Vec3) -> Color {
        let wo = self.frame.to_local(wo_world);
        if wo.z == 0.0 {
            return Color::ZERO;
        }
        let wi = self.frame.to_local(wi_world);

        let reflect = wi_world.dot(self.ng) * wo_world.dot(self.ng) > 0.0;
        let flags = self.flags();
        if (reflect && flags.contains(BxdfType::REFLECTION))
            || (!reflect && flags.contains(BxdfType::TRANSMISSION))
        {
            self.bxdf.f(wo, wi)
        } else {
            Color::ZERO
        }
    }

    pub fn pdf(&self, wo_world: Vec3, wi_world: Vec3) -> f32 {
        let wo = self.frame.to_local(wo_world);
        if wo.z == 0.0 {
            return 0.0;
        }
        self.bxdf.pdf(wo, self.frame.to_local(wi_world))
    }

    /// Sample an incident direction for `wo_world`. The returned `wi` is in world space.
    pub fn sample_f(&self, wo_world: Vec3, u: Vec2) -> Option<BxdfSample> {
        let wo = self.frame.to_local(wo_world);
        if wo.z == 0.0 {
            return None;
        }

        let mut sample = self.bxdf.sample_f(wo, u)?;
        if sample.pdf == 0.0 {
            return None;
        }
        sample.wi = self.frame.to_world(sample.wi);

        if !sample.sampled_type.contains(BxdfType::SPECULAR) {
            sample.f = self.f(wo_world, sample.wi);
        }
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    #[test]
    fn test_fresnel_dielectric() {
        // Normal incidence on glass: ((1.5 - 1) / (1.5 + 1))² = 0.04
        assert!((fr_dielectric(1.0, 1.0, 1.5) - 0.04).abs() < 1e-5);
        // Symmetric from the inside at normal incidence
        assert!((fr_dielectric(-1.0, 1.0, 1.5) - 0.04).abs() < 1e-5);
        // Grazing from inside beyond the critical angle
        assert_eq!(fr_dielectric(-0.1, 1.0, 1.5), 1.0);
        assert!(fr_dielectric(0.01, 1.0, 1.5) > 0.8);
    }

    #[test]
    fn test_refract_snell() {
        let wi = Vec3::new(0.6, 0.0, 0.8);
        let wt = refract(wi, Vec3::Z, 1.0 / 1.5).unwrap();
        assert!((wt.length() - 1.0).abs() < 1e-5);
        assert!(wt.z < 0.0);
        // sin θt = sin θi / 1.5
        assert!((wt.x.abs() - 0.6 / 1.5).abs() < 1e-5);

        // Leaving glass past the critical angle
        assert!(refract(Vec3::new(0.9, 0.0, 0.436), Vec3::Z, 1.5).is_none());
    }

    #[test]
    fn test_lambertian_energy() {
        let bxdf = Bxdf::LambertianReflection { r: Color::splat(0.5) };
        let wo = Vec3::new(0.3, 0.2, 0.9).normalize();
        let mut rng = Pcg32::seed_from_u64(11);

        // Monte Carlo estimate of the albedo ∫ f cos dω equals r
        let mut albedo = Color::ZERO;
        let n = 20_000;
        for _ in 0..n {
            let s = bxdf.sample_f(wo, Vec2::new(rng.gen(), rng.gen())).unwrap();
            assert!(s.wi.z > 0.0);
            assert!((s.pdf - bxdf.pdf(wo, s.wi)).abs() < 1e-6);
            albedo += s.f * s.wi.z / s.pdf;
        }
        albedo /= n as f32;
        assert!((albedo - Color::splat(0.5)).abs().max_element() < 1e-3);

        // Opposite hemisphere
        let below = Vec3::new(0.0, 0.0, -1.0);
        assert_eq!(bxdf.f(wo, below), Color::ZERO);
        assert_eq!(bxdf.pdf(wo, below), 0.0);
        assert!(bxdf.sample_f(below, Vec2::new(0.4, 0.4)).unwrap().wi.z < 0.0);
    }

    #[test]
    fn test_specular_reflection() {
        let bxdf = Bxdf::SpecularReflection {
            r: Color::ONE,
            fresnel: Fresnel::NoOp,
        };
        let wo = Vec3::new(0.6, 0.0, 0.8);
        let s = bxdf.sample_f(wo, Vec2::ZERO).unwrap();

        assert_eq!(s.wi, Vec3::new(-0.6, 0.0, 0.8));
        assert_eq!(s.pdf, 1.0);
        assert!(s.sampled_type.contains(BxdfType::SPECULAR));
        // f · cos / pdf carries all energy
        assert!(((s.f * s.wi.z / s.pdf) - Color::ONE).abs().max_element() < 1e-5);
        assert_eq!(bxdf.f(wo, s.wi), Color::ZERO);
        assert_eq!(bxdf.pdf(wo, s.wi), 0.0);
    }

    #[test]
    fn test_fresnel_specular_events() {
        let bxdf = Bxdf::FresnelSpecular {
            r: Color::ONE,
            t: Color::ONE,
            eta_a: 1.0,
            eta_b: 1.5,
        };
        let wo = Vec3::Z;
        let fr = fr_dielectric(1.0, 1.0, 1.5);

        let reflected = bxdf.sample_f(wo, Vec2::new(0.0, 0.5)).unwrap();
        assert!(reflected.sampled_type.contains(BxdfType::REFLECTION));
        assert!((reflected.pdf - fr).abs() < 1e-6);
        assert_eq!(reflected.eta_scale, 1.0);

        let transmitted = bxdf.sample_f(wo, Vec2::new(0.9, 0.5)).unwrap();
        assert!(transmitted.sampled_type.contains(BxdfType::TRANSMISSION));
        assert!((transmitted.wi - (-Vec3::Z)).length() < 1e-5);
        assert!((transmitted.pdf - (1.0 - fr)).abs() < 1e-6);
        // Entering glass compresses radiance by 1/1.5²
        let weight = transmitted.f * transmitted.wi.z.abs() / transmitted.pdf;
        assert!((weight.x - 1.0 / 2.25).abs() < 1e-5);
        assert!((transmitted.eta_scale - 2.25).abs() < 1e-5);
        assert!((weight.x * transmitted.eta_scale - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_bsdf_world_space() {
        let n = Vec3::new(0.0, 1.0, 0.0);
        let bsdf = Bsdf::new(n, Bxdf::LambertianReflection { r: Color::ONE });
        let wo = Vec3::new(0.0, 1.0, 1.0).normalize();

        let wi_above = Vec3::new(1.0, 1.0, 0.0).normalize();
        let wi_below = Vec3::new(1.0, -1.0, 0.0).normalize();
        assert!((bsdf.f(wo, wi_above) - Color::splat(FRAC_1_PI)).abs().max_element() < 1e-6);
        assert_eq!(bsdf.f(wo, wi_below), Color::ZERO);
        assert!(!bsdf.is_specular());

        let s = bsdf.sample_f(wo, Vec2::new(0.25, 0.75)).unwrap();
        assert!(s.wi.dot(n) > 0.0);
        assert!((s.pdf - bsdf.pdf(wo, s.wi)).abs() < 1e-5);
    }
}
