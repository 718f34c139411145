use crate::material::materials::*;

#[derive(Clone, Debug)]
pub struct Mirror(pub RGB);

impl MaterialImpl for Mirror {
    fn sample(&self, wo: &V3, n: &V3, _e: &V3) -> pdf::PdfSample<V3> {
        pdf::PdfSample {
            value: math::reflect(wo, n).normalize(),
            pdf: 1.0,
        }
    }

    // Dirac lobe: the cosine is divided out so that a sampled bounce carries
    // exactly the mirror colour.
    fn reflectance(&self, wi: &V3, wo: &V3, n: &V3) -> RGB {
        let cos = wi.dot(n);
        if cos > 0.0 && (math::reflect(wo, n) - wi).norm() < 1e-6 {
            self.0 / cos
        } else {
            RGB::all(0.0)
        }
    }

    fn exponent(&self) -> f64 {
        std::f64::INFINITY
    }
}
