//! Per-pixel reconstruction of the indirect filter: the analytic kernel
//! derived from a propagated covariance, and the brute-force density
//! estimate over a Monte Carlo sample pool.

use crate::accum::{running_mean, Bandwidth, SharedMax};
use crate::camera::Camera;
use crate::image::Buffer;
use crate::parallel::ParallelFor;
use crate::propagator::PositionCovariance;
use crate::scene::Scene;
use crate::validator::PositionFilter;
use crate::*;
use log::*;

/// Falloff of the analytic kernel along the covariance frame's normal.
const DEPTH_FALLOFF: f64 = 10.0;

/// Gain applied to the brute-force density before averaging.
pub const KERNEL_SCALE: f32 = 20.0;

const INV_SQRT_2PI: f64 = 0.398_942_280_4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Gaussian kernel from the inverse spatial covariance.
    #[default]
    Gaussian,
    /// Box over the principal extents.
    Polygonal,
}

impl FilterMode {
    pub fn toggled(self) -> Self {
        match self {
            FilterMode::Gaussian => FilterMode::Polygonal,
            FilterMode::Polygonal => FilterMode::Gaussian,
        }
    }
}

/// Spatial kernel derived once per frame from the covariance at the anchor
/// hit, then evaluated read-only for every pixel.
#[derive(Clone, Debug)]
pub struct FilterParams {
    anchor: P3,
    frame: [V3; 3],
    sxx: f64,
    sxy: f64,
    syy: f64,
    dx: V3,
    dy: V3,
}

impl FilterParams {
    pub fn from_covariance(pc: &PositionCovariance) -> Result<Self> {
        let (sxx, sxy, syy) = pc.cov.spatial_filter()?;
        let (dx, dy) = pc.cov.spatial_extent()?;
        Ok(FilterParams {
            anchor: pc.pos,
            frame: [pc.cov.x, pc.cov.y, pc.cov.z],
            sxx,
            sxy,
            syy,
            dx,
            dy,
        })
    }

    pub fn spatial_filter(&self) -> (f64, f64, f64) {
        (self.sxx, self.sxy, self.syy)
    }

    pub fn extent(&self) -> (V3, V3) {
        (self.dx, self.dy)
    }

    /// Kernel weight of a primary hit at `hit`.
    pub fn evaluate(&self, hit: &P3, mode: FilterMode) -> f32 {
        let d = self.anchor - hit;
        let [x, y, z] = &self.frame;
        let du = V3::new(d.dot(x), d.dot(y), d.dot(z));
        let depth = (-DEPTH_FALLOFF * du.z * du.z).exp();
        let w = match mode {
            FilterMode::Gaussian => {
                let q = self.sxx * du.x * du.x
                    + 2.0 * self.sxy * du.x * du.y
                    + self.syy * du.y * du.y;
                depth * (-0.5 * q).exp()
            }
            FilterMode::Polygonal => {
                let (lx, ly) = (self.dx.norm(), self.dy.norm());
                let u = du.dot(&self.dx) / lx;
                let v = du.dot(&self.dy) / ly;
                if u.abs() < lx && v.abs() < ly {
                    depth
                } else {
                    0.0
                }
            }
        };
        w as f32
    }
}

fn primary_hit(scene: &Scene, camera: &Camera, x: usize, y: usize) -> Option<P3> {
    scene
        .intersect(&camera.pixel_center_ray(x, y))
        .map(|hit| hit.hit.pos)
}

/// Fills `buf` with the analytic kernel evaluated at every pixel's primary
/// hit. Pixels that see nothing are cleared.
pub fn filter_image(
    params: &FilterParams,
    mode: FilterMode,
    scene: &Scene,
    camera: &Camera,
    buf: &mut Buffer,
    par: &ParallelFor,
) {
    let width = buf.w();
    par.for_each_row(buf.pixels_mut(), width, |y, row| {
        for (x, v) in row.iter_mut().enumerate() {
            *v = primary_hit(scene, camera, x, y)
                .map(|hit| params.evaluate(&hit, mode))
                .unwrap_or(0.0);
        }
    });
}

/// Unnormalized Gaussian density of the pooled samples at `hit`, each
/// weighted by its red channel.
pub fn density(pool: &[PositionFilter], hit: &P3, radius: f64) -> f64 {
    pool.iter()
        .map(|f| {
            let x = (hit - f.pos).norm() / radius;
            (INV_SQRT_2PI / radius) * (-0.5 * x * x).exp() * f.weight.r
        })
        .sum()
}

/// Progressive kernel density estimate: every pass folds a fresh pool into
/// the per-pixel running mean, then shrinks the kernel.
#[derive(Clone, Debug, Default)]
pub struct BruteForce {
    bandwidth: Bandwidth,
}

impl BruteForce {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bandwidth(&self) -> &Bandwidth {
        &self.bandwidth
    }

    pub fn reset(&mut self) {
        self.bandwidth.reset();
    }

    /// Folds the contribution of `pool`, drawn from `samples` paths, into a
    /// pixel's previous estimate.
    pub fn estimate(
        &self,
        previous: f32,
        hit: &P3,
        pool: &[PositionFilter],
        samples: usize,
    ) -> f32 {
        let sum = KERNEL_SCALE * density(pool, hit, self.bandwidth.radius()) as f32;
        running_mean(previous, self.bandwidth.passes() * samples, sum, samples)
    }

    pub fn end_pass(&mut self) {
        self.bandwidth.advance();
        debug!(
            "brute force pass {} done, radius now {}",
            self.bandwidth.passes(),
            self.bandwidth.radius()
        );
    }

    /// Runs one pass over the whole image and returns the display scale,
    /// the inverse of the largest estimate.
    pub fn pass(
        &mut self,
        pool: &[PositionFilter],
        samples: usize,
        scene: &Scene,
        camera: &Camera,
        buf: &mut Buffer,
        par: &ParallelFor,
    ) -> f32 {
        let max = SharedMax::new();
        let width = buf.w();
        par.for_each_row(buf.pixels_mut(), width, |y, row| {
            let mut row_max = 0.0f32;
            for (x, v) in row.iter_mut().enumerate() {
                if let Some(hit) = primary_hit(scene, camera, x, y) {
                    *v = self.estimate(*v, &hit, pool, samples);
                    row_max = row_max.max(*v);
                }
            }
            max.merge(row_max);
        });
        self.end_pass();
        let max = max.get();
        if max > 0.0 {
            1.0 / max
        } else {
            warn!("brute force image is empty, keeping unit scale");
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::Cov4D;
    use float_cmp::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn anisotropic() -> PositionCovariance {
        // Spatial block diag(4, 1) in a frame around +z.
        let cov = Cov4D::new(
            [4.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0],
            &V3::z(),
        );
        PositionCovariance {
            pos: P3::new(1.0, 2.0, 3.0),
            cov,
        }
    }

    #[test]
    fn kernel_peaks_at_anchor() {
        let params = FilterParams::from_covariance(&anisotropic()).unwrap();
        let anchor = P3::new(1.0, 2.0, 3.0);
        assert_eq!(params.evaluate(&anchor, FilterMode::Gaussian), 1.0);
        assert_eq!(params.evaluate(&anchor, FilterMode::Polygonal), 1.0);
    }

    #[test]
    fn gaussian_follows_inverse_spatial_block() {
        let pc = anisotropic();
        let params = FilterParams::from_covariance(&pc).unwrap();
        let (sxx, sxy, syy) = params.spatial_filter();
        assert!(approx_eq!(f64, sxx, 0.25, epsilon = 1e-12));
        assert!(approx_eq!(f64, sxy, 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, syy, 1.0, epsilon = 1e-12));

        let hit = pc.pos - pc.cov.x * 2.0;
        let expected = (-0.5f64).exp() as f32;
        let w = params.evaluate(&hit, FilterMode::Gaussian);
        assert!(approx_eq!(f32, w, expected, epsilon = 1e-6));
    }

    #[test]
    fn polygonal_is_a_box_over_extents() {
        let pc = anisotropic();
        let params = FilterParams::from_covariance(&pc).unwrap();
        let (dx, dy) = params.extent();
        assert!(approx_eq!(f64, dx.norm(), 2.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, dy.norm(), 1.0, epsilon = 1e-9));

        let inside = pc.pos - pc.cov.x * 1.5;
        let outside = pc.pos - pc.cov.x * 2.5;
        assert_eq!(params.evaluate(&inside, FilterMode::Polygonal), 1.0);
        assert_eq!(params.evaluate(&outside, FilterMode::Polygonal), 0.0);

        let off_plane = pc.pos - pc.cov.z * 0.1;
        let expected = (-0.1f64).exp() as f32;
        let w = params.evaluate(&off_plane, FilterMode::Polygonal);
        assert!(approx_eq!(f32, w, expected, epsilon = 1e-6));
    }

    #[test]
    fn degenerate_covariance_is_rejected() {
        let pc = PositionCovariance {
            pos: P3::origin(),
            cov: Cov4D::new([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0], &V3::z()),
        };
        assert!(matches!(
            FilterParams::from_covariance(&pc),
            Err(Error::DegenerateFilter { .. })
        ));
    }

    #[test]
    fn density_of_single_sample() {
        let pool = vec![PositionFilter {
            pos: P3::new(1.0, 0.0, 0.0),
            weight: RGB::new(2.0, 0.0, 0.0),
        }];
        let d = density(&pool, &P3::origin(), 1.0);
        assert!(approx_eq!(f64, d, 2.0 * INV_SQRT_2PI * (-0.5f64).exp(), epsilon = 1e-9));
    }

    fn gaussian_pool(rng: &mut SmallRng, n: usize) -> Vec<PositionFilter> {
        (0..n)
            .map(|_| {
                let (u1, u2): (f64, f64) = (rng.gen(), rng.gen());
                let r = (-2.0 * (1.0 - u1).ln()).sqrt();
                let theta = 2.0 * std::f64::consts::PI * u2;
                PositionFilter {
                    pos: P3::new(r * theta.cos(), r * theta.sin(), 0.0),
                    weight: RGB::all(1.0),
                }
            })
            .collect()
    }

    #[test]
    fn estimate_converges_across_passes() {
        let mut rng = SmallRng::seed_from_u64(1234);
        let mut bf = BruteForce::new();
        let samples = 200;
        let mut value = 0.0f32;
        let mut deltas = vec![];
        for _ in 0..30 {
            let pool = gaussian_pool(&mut rng, samples);
            let next = bf.estimate(value, &P3::origin(), &pool, samples);
            deltas.push((next - value).abs());
            value = next;
            bf.end_pass();
        }
        let early = deltas[1..6].iter().sum::<f32>() / 5.0;
        let late = deltas[25..30].iter().sum::<f32>() / 5.0;
        assert!(late < early);
        assert!(value > 0.0);
    }

    #[test]
    fn reset_restores_initial_kernel() {
        let mut bf = BruteForce::new();
        bf.end_pass();
        bf.end_pass();
        assert_eq!(bf.bandwidth().passes(), 2);
        bf.reset();
        assert_eq!(bf.bandwidth().passes(), 0);
        assert_eq!(bf.bandwidth().radius(), 1.0);
    }

    #[test]
    fn mode_toggles_back_and_forth() {
        assert_eq!(FilterMode::default(), FilterMode::Gaussian);
        assert_eq!(FilterMode::Gaussian.toggled(), FilterMode::Polygonal);
        assert_eq!(FilterMode::Polygonal.toggled().toggled(), FilterMode::Polygonal);
    }
}
