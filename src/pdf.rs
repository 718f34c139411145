use crate::*;
use std::f64::consts::PI;

#[derive(Clone, Debug)]
pub struct PdfSample<T> {
    pub value: T,
    pub pdf: f64,
}

impl<T> PdfSample<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> PdfSample<U> {
        PdfSample {
            value: f(self.value),
            pdf: self.pdf,
        }
    }
}

/// Cosine-weighted direction around local +z from two uniform numbers.
pub fn cos_hemisphere(u1: f64, u2: f64) -> PdfSample<V3> {
    let r = u1.sqrt();
    let theta = 2.0 * PI * u2;
    let z = (1.0 - u1).max(0.0).sqrt();
    PdfSample {
        value: V3::new(r * theta.cos(), r * theta.sin(), z),
        pdf: z * std::f64::consts::FRAC_1_PI,
    }
}

/// Direction around local +z distributed as `cos^exponent` of its angle to z.
pub fn phong_lobe(exponent: f64, u1: f64, u2: f64) -> PdfSample<V3> {
    let cos_a = u1.powf(1.0 / (exponent + 1.0));
    let sin_a = (1.0 - cos_a * cos_a).max(0.0).sqrt();
    let theta = 2.0 * PI * u2;
    PdfSample {
        value: V3::new(sin_a * theta.cos(), sin_a * theta.sin(), cos_a),
        pdf: (exponent + 1.0) / (2.0 * PI) * cos_a.powf(exponent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn warps_return_unit_upper_directions(u1 in 0.0..1.0f64, u2 in 0.0..1.0f64) {
            for s in &[cos_hemisphere(u1, u2), phong_lobe(100.0, u1, u2)] {
                prop_assert!(approx_eq!(f64, s.value.norm(), 1.0, epsilon = 1e-9));
                prop_assert!(s.value[2] >= 0.0);
                prop_assert!(s.pdf >= 0.0);
            }
        }
    }

    #[test]
    fn sharper_lobe_concentrates_around_axis() {
        let wide = phong_lobe(10.0, 0.5, 0.3);
        let sharp = phong_lobe(1000.0, 0.5, 0.3);
        assert!(sharp.value[2] > wide.value[2]);
        assert!(sharp.pdf > wide.pdf);
    }
}
