use crate::material::materials::*;
use std::f64::consts::PI;

/// Normalized Phong lobe around the mirror direction.
#[derive(Clone, Debug)]
pub struct Phong {
    pub color: RGB,
    pub exponent: f64,
}

impl MaterialImpl for Phong {
    fn sample(&self, wo: &V3, n: &V3, e: &V3) -> pdf::PdfSample<V3> {
        let r = math::reflect(wo, n).normalize();
        let lc = LocalCoord::new_z(&P3::origin(), &r);
        pdf::phong_lobe(self.exponent, e[0], e[1]).map(|local| lc.l2w() * local)
    }

    fn reflectance(&self, wi: &V3, wo: &V3, n: &V3) -> RGB {
        if wi.dot(n) <= 0.0 || wo.dot(n) <= 0.0 {
            return RGB::all(0.0);
        }
        let cos_a = math::reflect(wo, n).normalize().dot(wi).max(0.0);
        self.color * ((self.exponent + 2.0) / (2.0 * PI) * cos_a.powf(self.exponent))
    }

    fn exponent(&self) -> f64 {
        self.exponent
    }
}
