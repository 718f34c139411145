use crate::*;

/// Sampling and evaluation contract a surface offers to the path samplers.
/// Directions point away from the surface; `n` faces `wo`.
pub trait MaterialImpl {
    fn sample(&self, wo: &V3, n: &V3, e: &V3) -> pdf::PdfSample<V3>;

    fn reflectance(&self, wi: &V3, wo: &V3, n: &V3) -> RGB;

    /// Lobe sharpness; higher is glossier.
    fn exponent(&self) -> f64;
}

mod lambert;
pub use lambert::*;

mod mirror;
pub use mirror::*;

mod phong;
pub use phong::*;
