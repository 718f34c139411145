use crate::scene::Scene;
use crate::*;
use log::*;
use rand::Rng;

/// Path-traced radiance along `ray`, collecting emission from the camera hit
/// and from up to `max_depth` importance-sampled bounces.
pub fn radiance<R: ?Sized>(scene: &Scene, ray: &Ray, rng: &mut R, max_depth: usize) -> RGB
where
    R: Rng,
{
    let mut ray = ray.clone();
    let mut throughput = RGB::all(1.0);
    let mut radiance = RGB::all(0.0);

    for depth in 0..=max_depth {
        let hit = match scene.intersect(&ray) {
            Some(hit) => hit,
            None => break,
        };

        if let Some(emission) = hit.object.emission {
            radiance += throughput * emission;
        }
        if depth == max_depth {
            break;
        }

        let nl = hit.hit.facing_normal(&ray.dir);
        let wo = -ray.dir;
        let e = V3::new(rng.gen(), rng.gen(), rng.gen());
        let next = hit.material().sample(&wo, &nl, &e);
        let wi = next.value;
        let bsdf_cos = hit.material().reflectance(&wi, &wo, &nl) * wi.dot(&nl);
        throughput *= bsdf_cos / next.pdf;

        if !throughput.is_finite() {
            warn!("throughput is not finite {:?}", throughput);
            warn!("> wo {:?}", wo);
            warn!("> wi {:?}", wi);
            warn!("> bsdf_cos {:?}", bsdf_cos);
            warn!("> next.pdf {:?}", next.pdf);
            break;
        }
        if throughput.is_black() {
            break;
        }

        ray = Ray::new(hit.hit.pos, wi);
    }
    radiance
}
