use crate::*;

pub mod materials;
use materials::MaterialImpl;

#[derive(Clone, Debug)]
pub enum Material {
    Lambert(materials::Lambert),
    Phong(materials::Phong),
    Mirror(materials::Mirror),
}

impl_wrap_from_many! {Material, materials, [Lambert, Phong, Mirror]}

/// Spectral bandwidth of a lobe of the given sharpness exponent.
pub fn lobe_bandwidth(exponent: f64) -> f64 {
    exponent / (4.0 * std::f64::consts::PI * std::f64::consts::PI)
}

impl Material {
    pub fn new_lambert(color: RGB) -> Self {
        materials::Lambert(color).into()
    }

    pub fn new_phong(color: RGB, exponent: f64) -> Self {
        materials::Phong { color, exponent }.into()
    }

    pub fn new_mirror(color: RGB) -> Self {
        materials::Mirror(color).into()
    }

    /// Draws an incoming direction `wi` for the outgoing direction `wo`
    /// around the facing normal `n`, from the random triple `e`.
    pub fn sample(&self, wo: &V3, n: &V3, e: &V3) -> pdf::PdfSample<V3> {
        dispatch_variants!(self, Material, [Lambert, Phong, Mirror], m => m.sample(wo, n, e))
    }

    pub fn reflectance(&self, wi: &V3, wo: &V3, n: &V3) -> RGB {
        dispatch_variants!(self, Material, [Lambert, Phong, Mirror], m => m.reflectance(wi, wo, n))
    }

    pub fn exponent(&self) -> f64 {
        dispatch_variants!(self, Material, [Lambert, Phong, Mirror], m => m.exponent())
    }

    /// Angular variance the lobe adds during BRDF convolution, the inverse of
    /// its spectral bandwidth. Zero for a perfect mirror.
    pub fn lobe_variance(&self) -> f64 {
        let bandwidth = lobe_bandwidth(self.exponent());
        if bandwidth.is_infinite() {
            0.0
        } else {
            1.0 / bandwidth
        }
    }

    /// Copy with a new sharpness; only glossy lobes have a tunable exponent.
    pub fn with_exponent(&self, exponent: f64) -> Self {
        match self {
            Material::Phong(p) => Material::new_phong(p.color, exponent),
            other => other.clone(),
        }
    }
}
