use crate::material::materials::*;

#[derive(Clone, Debug)]
pub struct Lambert(pub RGB);

impl MaterialImpl for Lambert {
    fn sample(&self, _wo: &V3, n: &V3, e: &V3) -> pdf::PdfSample<V3> {
        let lc = LocalCoord::new_z(&P3::origin(), n);
        pdf::cos_hemisphere(e[0], e[1]).map(|local| lc.l2w() * local)
    }

    fn reflectance(&self, wi: &V3, wo: &V3, n: &V3) -> RGB {
        if wi.dot(n) * wo.dot(n) > 0.0 {
            self.0 * std::f64::consts::FRAC_1_PI
        } else {
            RGB::all(0.0)
        }
    }

    // a cosine lobe
    fn exponent(&self) -> f64 {
        1.0
    }
}
