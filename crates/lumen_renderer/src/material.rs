//! Surface materials.

use lumen_math::Vec3;

use crate::bsdf::{Bsdf, Bxdf, Fresnel};

/// Color type alias (linear RGB radiance or reflectance)
pub type Color = Vec3;

/// Closed set of materials. Each one turns into a [`Bsdf`] at a hit point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lambertian diffuse reflector.
    Matte { kd: Color },
    /// Perfect mirror.
    Mirror { r: Color },
    /// Smooth dielectric with index of refraction `eta` inside, vacuum outside.
    Glass { r: Color, t: Color, eta: f32 },
}

impl Material {
    pub fn matte(kd: Color) -> Self {
        Material::Matte { kd }
    }

    pub fn mirror(r: Color) -> Self {
        Material::Mirror { r }
    }

    /// Clear glass with index of refraction `eta`.
    pub fn glass(eta: f32) -> Self {
        Material::Glass {
            r: Color::ONE,
            t: Color::ONE,
            eta,
        }
    }

    /// Build the BSDF at a surface point with unit normal `n`. Black materials
    /// scatter nothing and return `None`.
    pub fn compute_bsdf(&self, n: Vec3) -> Option<Bsdf> {
        let bxdf = match *self {
            Material::Matte { kd } => {
                if kd == Color::ZERO {
                    return None;
                }
                Bxdf::LambertianReflection { r: kd }
            }
            Material::Mirror { r } => {
                if r == Color::ZERO {
                    return None;
                }
                Bxdf::SpecularReflection {
                    r,
                    fresnel: Fresnel::NoOp,
                }
            }
            Material::Glass { r, t, eta } => {
                if r == Color::ZERO && t == Color::ZERO {
                    return None;
                }
                Bxdf::FresnelSpecular {
                    r,
                    t,
                    eta_a: 1.0,
                    eta_b: eta,
                }
            }
        };
        Some(Bsdf::new(n, bxdf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::BxdfType;

    #[test]
    fn test_black_matte_has_no_bsdf() {
        assert!(Material::matte(Color::ZERO).compute_bsdf(Vec3::Z).is_none());
        assert!(Material::mirror(Color::ZERO).compute_bsdf(Vec3::Z).is_none());
    }

    #[test]
    fn test_material_flags() {
        let matte = Material::matte(Color::splat(0.5)).compute_bsdf(Vec3::Z).unwrap();
        assert!(!matte.is_specular());
        assert!(matte.flags().contains(BxdfType::DIFFUSE));

        let mirror = Material::mirror(Color::ONE).compute_bsdf(Vec3::Z).unwrap();
        assert!(mirror.is_specular());

        let glass = Material::glass(1.5).compute_bsdf(Vec3::Z).unwrap();
        assert!(glass.flags().contains(BxdfType::TRANSMISSION | BxdfType::SPECULAR));
    }
}
