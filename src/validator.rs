//! Monte Carlo reference for the indirect pixel filter: explicit paths
//! through a pixel, recording where they end and with what weight.

use crate::camera::Camera;
use crate::parallel::{stream_seed, ParallelFor};
use crate::scene::Scene;
use crate::*;
use log::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Terminal position of a sampled path and its throughput.
#[derive(Clone, Debug)]
pub struct PositionFilter {
    pub pos: P3,
    pub weight: RGB,
}

/// Samples an indirect path from `ray`, importance-sampling each material,
/// and returns the hit at `max_depth` with the product of the bounce weights
/// `(wi·n) f(wi, wo) / pdf`.
pub fn indirect_filter<R: ?Sized>(
    scene: &Scene,
    ray: &Ray,
    rng: &mut R,
    depth: usize,
    max_depth: usize,
) -> Option<PositionFilter>
where
    R: Rng,
{
    let mut ray = ray.clone();
    let mut throughput = RGB::all(1.0);
    let mut depth = depth;
    loop {
        let hit = scene.intersect(&ray)?;
        let pos = hit.hit.pos;
        if depth >= max_depth {
            return Some(PositionFilter {
                pos,
                weight: throughput,
            });
        }

        let nl = hit.hit.facing_normal(&ray.dir);
        let wo = -ray.dir;
        let e = V3::new(rng.gen(), rng.gen(), rng.gen());
        let next = hit.material().sample(&wo, &nl, &e);
        let wi = next.value;
        let f = hit.material().reflectance(&wi, &wo, &nl);
        throughput *= f * (wi.dot(&nl) / next.pdf);

        if !throughput.is_finite() {
            warn!("sample weight is not finite {:?}", throughput);
            warn!("> wo {:?}, wi {:?}, pdf {:?}", wo, wi, next.pdf);
            return None;
        }

        ray = Ray::new(pos, wi);
        depth += 1;
    }
}

/// Draws `samples` indirect paths through `pixel`, jittered inside it, split
/// evenly across the workers of `par` (`samples / nthread` each). Paths that
/// escape or carry no energy are not pooled.
pub fn sample_pool(
    scene: &Scene,
    camera: &Camera,
    pixel: (usize, usize),
    samples: usize,
    max_depth: usize,
    par: &ParallelFor,
    seed: u64,
) -> Vec<PositionFilter> {
    let nthread = par.nthread();
    let per_worker = samples / nthread;
    let pool = Mutex::new(Vec::with_capacity(per_worker * nthread));
    par.for_each(nthread, |worker| {
        let mut rng = SmallRng::seed_from_u64(stream_seed(seed, &[worker as u64]));
        for _ in 0..per_worker {
            let dx: f64 = rng.gen();
            let dy: f64 = rng.gen();
            let ray = camera.ray_through(pixel.0 as f64 + dx, pixel.1 as f64 + dy);
            let filter = match indirect_filter(scene, &ray, &mut rng, 0, max_depth) {
                Some(f) if !f.weight.is_black() => f,
                _ => continue,
            };
            pool.lock()
                .unwrap_or_else(|e| {
                    warn!("indirect sample pool poisoned by a panicked worker");
                    e.into_inner()
                })
                .push(filter);
        }
    });
    let pool = pool.into_inner().unwrap_or_else(|e| e.into_inner());
    debug!("pooled {} of {} indirect samples", pool.len(), samples);
    pool
}
