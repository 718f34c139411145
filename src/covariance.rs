//! Covariance of the local light-field spectrum around a ray.
//!
//! The four dimensions are two spatial (x, y) and two angular (u, v)
//! coordinates measured in a local orthonormal frame whose z axis is either
//! the propagation direction (ray space) or the surface normal (tangent
//! space). Every operator is the frequency-domain counterpart of a linear
//! ray-transfer operator: a primal transform `A` acts on the spectrum as
//! `A^-T`, so each operator is a congruence `M Σ Mᵀ` with `M = A^-T`. The
//! only exception is [`Cov4D::reflection`], which multiplies the spectrum
//! by the BRDF's and therefore adds precision instead.

use crate::error::{Error, Result};
use crate::math::tangent_basis;
use crate::V3;
use log::*;
use nalgebra::{Matrix2, Matrix4, Matrix4x2, SymmetricEigen, Vector4};
use std::fmt;

/// Spectral covariance of a pinhole pixel: effectively unbounded in every
/// dimension.
pub const PIXEL_SPECTRUM: f64 = 1.0e5;

/// Below this `|cos|` a projection is treated as grazing and clamped.
const MIN_COSINE: f64 = 1.0e-6;

/// Relative bound on the spatial determinant under which the spatial block is
/// considered singular.
const SINGULAR_RATIO: f64 = 1.0e-12;

// Row offsets of the upper-triangular storage:
// (0,0) (0,1) (0,2) (0,3) (1,1) (1,2) (1,3) (2,2) (2,3) (3,3)
const ROW_OFFSET: [usize; 4] = [0, 4, 7, 9];

fn packed_index(i: usize, j: usize) -> usize {
    let (i, j) = if i <= j { (i, j) } else { (j, i) };
    ROW_OFFSET[i] + j - i
}

fn clamp_cosine(c: f64) -> f64 {
    if c.abs() >= MIN_COSINE {
        c
    } else if c < 0.0 {
        -MIN_COSINE
    } else {
        MIN_COSINE
    }
}

/// 4D covariance with its local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cov4D {
    entries: [f64; 10],
    pub x: V3,
    pub y: V3,
    pub z: V3,
}

impl Cov4D {
    /// Builds a covariance from its upper-triangular entries in a frame
    /// around `z`.
    pub fn new(entries: [f64; 10], z: &V3) -> Self {
        let z = z.normalize();
        let (x, y) = tangent_basis(&z);
        Cov4D { entries, x, y, z }
    }

    /// Initial covariance of a camera ray leaving a pinhole in direction `dir`.
    pub fn pixel(dir: &V3) -> Self {
        let s = PIXEL_SPECTRUM;
        Self::new([s, 0.0, 0.0, 0.0, s, 0.0, 0.0, s, 0.0, s], dir)
    }

    fn from_matrix(m: &Matrix4<f64>, x: V3, y: V3, z: V3) -> Self {
        let mut entries = [0.0; 10];
        for i in 0..4 {
            for j in i..4 {
                entries[packed_index(i, j)] = 0.5 * (m[(i, j)] + m[(j, i)]);
            }
        }
        Cov4D { entries, x, y, z }
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.entries[packed_index(i, j)]
    }

    pub fn matrix(&self) -> Matrix4<f64> {
        Matrix4::from_fn(|i, j| self.get(i, j))
    }

    fn congruence(&self, m: &Matrix4<f64>) -> Self {
        let s = m * self.matrix() * m.transpose();
        Self::from_matrix(&s, self.x, self.y, self.z)
    }

    /// Rotates the frame about z by `phi`; the covariance itself is unchanged,
    /// only its coordinates are re-expressed.
    fn rotated(&self, phi: f64) -> Self {
        let (s, c) = phi.sin_cos();
        #[rustfmt::skip]
        let m = Matrix4::new(
              c,   s, 0.0, 0.0,
             -s,   c, 0.0, 0.0,
            0.0, 0.0,   c,   s,
            0.0, 0.0,  -s,   c,
        );
        let mut rotated = self.congruence(&m);
        rotated.x = c * self.x + s * self.y;
        rotated.y = -s * self.x + c * self.y;
        rotated
    }

    /// Same covariance with the frame turned about z so that its x axis
    /// follows the projection of `x_like`.
    pub fn aligned_to(&self, x_like: &V3) -> Self {
        self.rotated(x_like.dot(&self.y).atan2(x_like.dot(&self.x)))
    }

    /// Free-space transport over a distance `t`.
    ///
    /// Positions shear with angles (`x' = x + t·θ`), so angular frequencies
    /// shear with spatial ones. The determinant is preserved.
    pub fn travel(&self, t: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(2, 0)] = -t;
        m[(3, 1)] = -t;
        self.congruence(&m)
    }

    /// Re-expresses the ray-space covariance in the tangent frame of a
    /// surface with normal `n`.
    ///
    /// The frame is first turned so that x lies in the plane of incidence.
    /// With `c = n·z`, a footprint stretches by `1/c` along x on the surface
    /// while directions compress by `|c|`; angles are then measured on the
    /// side the ray comes from, which flips the out-of-plane angle for an
    /// incoming ray.
    pub fn projection(&self, n: &V3) -> Self {
        let c = clamp_cosine(n.dot(&self.z));
        let in_plane = n - c * self.z;
        let aligned = if in_plane.norm() > MIN_COSINE {
            self.rotated(in_plane.dot(&self.y).atan2(in_plane.dot(&self.x)))
        } else {
            *self
        };
        let m = Matrix4::from_diagonal(&Vector4::new(c, 1.0, 1.0 / c.abs(), c.signum()));
        let mut projected = aligned.congruence(&m);
        projected.y = (aligned.y - aligned.y.dot(n) * n).normalize();
        projected.x = projected.y.cross(n);
        projected.z = *n;
        projected
    }

    /// Inverse of [`Cov4D::projection`]: back to ray space along `dir`.
    pub fn inverse_projection(&self, dir: &V3) -> Self {
        let n = self.z;
        let c = clamp_cosine(n.dot(dir));
        let tangential = dir - c * n;
        let aligned = if tangential.norm() > MIN_COSINE {
            self.rotated((-tangential.dot(&self.y)).atan2(-tangential.dot(&self.x)))
        } else {
            *self
        };
        let m = Matrix4::from_diagonal(&Vector4::new(1.0 / c, 1.0, c.abs(), c.signum()));
        let mut unprojected = aligned.congruence(&m);
        unprojected.y = (aligned.y - aligned.y.dot(dir) * dir).normalize();
        unprojected.x = unprojected.y.cross(dir);
        unprojected.z = *dir;
        unprojected
    }

    /// Local curvature of the surface along the two tangent axes.
    ///
    /// Angles relative to the local normal drift as `θ - k·x`, which mixes
    /// angular frequencies into spatial ones. `curvature(-k1, -k2)` undoes it.
    pub fn curvature(&self, k1: f64, k2: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 2)] = k1;
        m[(1, 3)] = k2;
        self.congruence(&m)
    }

    pub fn inverse_curvature(&self, k1: f64, k2: f64) -> Self {
        self.curvature(-k1, -k2)
    }

    /// Foreshortening: angular frequencies scale by `c`.
    pub fn cosine(&self, c: f64) -> Self {
        let m = Matrix4::from_diagonal(&Vector4::new(1.0, 1.0, c, c));
        self.congruence(&m)
    }

    /// Mirrors the angular block about the normal so that the lobe is
    /// parametrised around the reflected direction.
    pub fn symmetry(&self) -> Self {
        let m = Matrix4::from_diagonal(&Vector4::new(1.0, 1.0, -1.0, -1.0));
        self.congruence(&m)
    }

    /// BRDF convolution with a Gaussian lobe of angular variances `r1`, `r2`.
    ///
    /// Computes `(Σ⁻¹ + diag(0, 0, r1, r2))⁻¹` without inverting `Σ`:
    /// `Σ - ΣPᵀ (I + R·PΣPᵀ)⁻¹ R·PΣ`. Zero variance leaves `Σ` untouched.
    pub fn reflection(&self, r1: f64, r2: f64) -> Self {
        let s = self.matrix();
        let angular = Matrix2::new(s[(2, 2)], s[(2, 3)], s[(3, 2)], s[(3, 3)]);
        let r = Matrix2::new(r1, 0.0, 0.0, r2);
        let gain = match (Matrix2::identity() + r * angular).try_inverse() {
            Some(inv) => inv * r,
            None => {
                warn!("BRDF convolution skipped, singular gain for r = ({}, {})", r1, r2);
                return *self;
            }
        };
        let cross = Matrix4x2::from_fn(|i, j| s[(i, j + 2)]);
        let update = cross * gain * cross.transpose();
        Self::from_matrix(&(s - update), self.x, self.y, self.z)
    }

    /// Determinant of the covariance.
    pub fn volume(&self) -> f64 {
        self.matrix().determinant()
    }

    fn spatial_block(&self) -> Result<Matrix2<f64>> {
        let (sxx, sxy, syy) = (self.get(0, 0), self.get(0, 1), self.get(1, 1));
        let determinant = sxx * syy - sxy * sxy;
        let well_formed = sxx > 0.0 && syy > 0.0 && determinant.is_finite();
        if !well_formed || determinant <= SINGULAR_RATIO * sxx * syy {
            return Err(Error::DegenerateFilter { determinant });
        }
        Ok(Matrix2::new(sxx, sxy, sxy, syy))
    }

    /// Inverse of the spatial block, `(sxx, sxy, syy)`, used as the quadratic
    /// form of the Gaussian pixel kernel.
    pub fn spatial_filter(&self) -> Result<(f64, f64, f64)> {
        let block = self.spatial_block()?;
        let determinant = block.determinant();
        Ok((
            block[(1, 1)] / determinant,
            -block[(0, 1)] / determinant,
            block[(0, 0)] / determinant,
        ))
    }

    /// Principal axes of the spatial block scaled by their standard
    /// deviations, in local frame coordinates (z component is zero). The
    /// major axis comes first.
    pub fn spatial_extent(&self) -> Result<(V3, V3)> {
        let eigen = SymmetricEigen::new(self.spatial_block()?);
        let axis = |k: usize| {
            let e = eigen.eigenvectors.column(k);
            V3::new(e[0], e[1], 0.0) * eigen.eigenvalues[k].sqrt()
        };
        let (a, b) = (axis(0), axis(1));
        if a.norm() >= b.norm() {
            Ok((a, b))
        } else {
            Ok((b, a))
        }
    }
}

impl fmt::Display for Cov4D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in 0..4 {
            write!(f, "[")?;
            for j in 0..4 {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:>12.5e}", self.get(i, j))?;
            }
            writeln!(f, "]")?;
        }
        let v = |v: &V3| format!("({:.4}, {:.4}, {:.4})", v[0], v[1], v[2]);
        write!(f, "frame x = {}, y = {}, z = {}", v(&self.x), v(&self.y), v(&self.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    fn assert_close(a: &Cov4D, b: &Cov4D, eps: f64) {
        let (ma, mb) = (a.matrix(), b.matrix());
        let scale = 1.0 + mb.abs().max();
        let diff = (ma - mb).abs().max();
        assert!(diff <= eps * scale, "covariances differ by {}\n{}\n{}", diff, a, b);
    }

    fn psd(values: [f64; 16], z: &V3) -> Cov4D {
        let a = Matrix4::from_row_slice(&values);
        let s = a * a.transpose() + Matrix4::identity();
        let (x, y) = tangent_basis(&z.normalize());
        Cov4D::from_matrix(&s, x, y, z.normalize())
    }

    fn direction() -> impl Strategy<Value = V3> {
        (-1.0..1.0f64, -1.0..1.0f64, -1.0..1.0f64)
            .prop_filter("non-zero direction", |(x, y, z)| x * x + y * y + z * z > 0.01)
            .prop_map(|(x, y, z)| V3::new(x, y, z).normalize())
    }

    #[test]
    fn packed_storage_is_symmetric() {
        let c = Cov4D::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0], &V3::z());
        assert_eq!(c.get(0, 3), 4.0);
        assert_eq!(c.get(3, 0), 4.0);
        assert_eq!(c.get(2, 1), 6.0);
        assert_eq!(c.get(3, 3), 10.0);
        assert_eq!(c.matrix(), c.matrix().transpose());
    }

    #[test]
    fn pixel_covariance_frame_follows_direction() {
        let dir = V3::new(0.0, -0.3, -1.0);
        let c = Cov4D::pixel(&dir);
        assert!(approx_eq!(f64, (c.z - dir.normalize()).norm(), 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, c.x.cross(&c.y).dot(&c.z), 1.0, epsilon = 1e-12));
        assert_eq!(c.get(2, 2), PIXEL_SPECTRUM);
    }

    #[test]
    fn cosine_one_is_identity() {
        let c = psd([0.3; 16], &V3::new(0.2, 0.1, -1.0));
        assert_eq!(c.cosine(1.0), c);
    }

    #[test]
    fn reflection_without_blur_is_identity() {
        let c = psd(
            [0.5, -0.2, 0.1, 0.0, 0.3, 0.9, -0.4, 0.2, 0.1, 0.0, 0.7, -0.5, 0.2, 0.3, 0.0, 0.8],
            &V3::z(),
        );
        assert_eq!(c.reflection(0.0, 0.0), c);
    }

    #[test]
    fn reflection_bounds_angular_variance() {
        let c = Cov4D::pixel(&V3::z()).travel(50.0);
        let r = 0.25;
        let blurred = c.reflection(r, r);
        assert!(blurred.get(2, 2) <= 1.0 / r + 1e-6);
        assert!(blurred.get(3, 3) <= 1.0 / r + 1e-6);
        assert!(blurred.get(2, 2) < c.get(2, 2));
    }

    #[test]
    fn symmetry_flips_spatial_angular_terms() {
        let c = Cov4D::pixel(&V3::z()).travel(2.0);
        let s = c.symmetry();
        assert_eq!(s.get(0, 2), -c.get(0, 2));
        assert_eq!(s.get(2, 2), c.get(2, 2));
        assert_eq!(s.symmetry(), c);
    }

    #[test]
    fn projection_moves_frame_to_tangent_plane() {
        let c = Cov4D::pixel(&V3::new(0.0, 0.0, -1.0));
        let n = V3::new(0.0, 0.6, 0.8);
        let p = c.projection(&n);
        assert_eq!(p.z, n);
        assert!(approx_eq!(f64, p.x.dot(&n), 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, p.y.dot(&n), 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, p.x.cross(&p.y).dot(&n), 1.0, epsilon = 1e-12));
    }

    #[test]
    fn degenerate_spatial_block_is_reported() {
        let angular_only = Cov4D::new([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0], &V3::z());
        assert!(matches!(
            angular_only.spatial_filter(),
            Err(Error::DegenerateFilter { .. })
        ));
        let rank_one = Cov4D::new([1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0], &V3::z());
        assert!(rank_one.spatial_filter().is_err());
        assert!(rank_one.spatial_extent().is_err());
    }

    #[test]
    fn extent_axes_lie_on_unit_filter_ellipse() {
        let c = Cov4D::new([4.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 1.0, 0.0, 1.0], &V3::z());
        let (sxx, sxy, syy) = c.spatial_filter().unwrap();
        let (dx, dy) = c.spatial_extent().unwrap();
        for d in &[dx, dy] {
            let q = sxx * d[0] * d[0] + 2.0 * sxy * d[0] * d[1] + syy * d[1] * d[1];
            assert!(approx_eq!(f64, q, 1.0, epsilon = 1e-9));
            assert_eq!(d[2], 0.0);
        }
        assert!(approx_eq!(f64, dx.dot(&dy), 0.0, epsilon = 1e-9));
        assert!(dx.norm() >= dy.norm());
    }

    proptest! {
        #[test]
        fn inverse_projection_undoes_projection(
            values in prop::array::uniform16(-1.0..1.0f64),
            z in direction(),
            n in direction(),
        ) {
            prop_assume!(n.dot(&z).abs() > 0.2);
            let c = psd(values, &z);
            let round_trip = c.projection(&n).inverse_projection(&c.z).aligned_to(&c.x);
            prop_assert!((round_trip.z - c.z).norm() < 1e-9);
            assert_close(&round_trip, &c, 1e-9);
        }

        #[test]
        fn curvature_is_inverted_by_opposite_curvature(
            values in prop::array::uniform16(-1.0..1.0f64),
            k1 in -10.0..10.0f64,
            k2 in -10.0..10.0f64,
        ) {
            let c = psd(values, &V3::z());
            assert_close(&c.curvature(k1, k2).inverse_curvature(k1, k2), &c, 1e-9);
        }

        #[test]
        fn travel_does_not_shrink_volume(
            values in prop::array::uniform16(-1.0..1.0f64),
            t in 0.0..5.0f64,
        ) {
            let c = psd(values, &V3::z());
            let before = c.volume();
            let after = c.travel(t).volume();
            prop_assert!(after >= before - 1e-6 * before.abs().max(1.0));
        }

        #[test]
        fn alignment_preserves_volume(
            values in prop::array::uniform16(-1.0..1.0f64),
            x in direction(),
        ) {
            let c = psd(values, &V3::z());
            let aligned = c.aligned_to(&x);
            prop_assert!(approx_eq!(f64, aligned.volume(), c.volume(), epsilon = 1e-6 * c.volume().abs()));
        }
    }
}
