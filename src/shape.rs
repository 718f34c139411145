use crate::*;

#[derive(Clone, Debug)]
pub struct Hit {
    pub dist: f64,
    pub pos: P3,
    pub gnorm: V3,
}

impl Hit {
    /// Geometric normal flipped to face the incoming direction `dir`.
    pub fn facing_normal(&self, dir: &V3) -> V3 {
        if self.gnorm.dot(dir) < 0.0 {
            self.gnorm
        } else {
            -self.gnorm
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sphere {
    pub center: P3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: P3, radius: f64) -> Self {
        Sphere { center, radius }
    }

    fn make_hit(&self, ray: &Ray, dist: f64) -> Hit {
        let pos = ray.at(dist);
        Hit {
            dist,
            pos,
            gnorm: (pos - self.center).normalize(),
        }
    }

    pub fn test_hit(&self, ray: &Ray, tnear: f64, tfar: f64) -> Option<Hit> {
        if tnear > tfar {
            return None;
        }
        let rel_c = self.center - ray.origin;
        let d_oh = ray.dir.dot(&rel_c);
        let rel_h = ray.dir * d_oh;
        let d_ch_sq = (rel_c - rel_h).norm_squared();
        if d_ch_sq > self.radius * self.radius {
            None
        } else {
            let l = (self.radius * self.radius - d_ch_sq).sqrt();
            let tmin = d_oh - l;
            let tmax = d_oh + l;
            if tnear < tmin && tmin < tfar {
                Some(self.make_hit(ray, tmin))
            } else if tnear < tmax && tmax < tfar {
                Some(self.make_hit(ray, tmax))
            } else {
                None
            }
        }
    }

    /// Both principal curvatures of a sphere are `1/radius`.
    pub fn curvature(&self) -> f64 {
        1.0 / self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn hits_front_face_first() {
        let s = Sphere::new(P3::new(0.0, 0.0, 0.0), 2.0);
        let ray = Ray::new(P3::new(0.0, 0.0, 10.0), V3::new(0.0, 0.0, -1.0));
        let hit = s.test_hit(&ray, 1e-4, f64::MAX).unwrap();
        assert!(approx_eq!(f64, hit.dist, 8.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, hit.gnorm[2], 1.0, epsilon = 1e-12));
    }

    #[test]
    fn hits_back_face_from_inside() {
        let s = Sphere::new(P3::origin(), 100.0);
        let ray = Ray::new(P3::origin(), V3::new(1.0, 0.0, 0.0));
        let hit = s.test_hit(&ray, 1e-4, f64::MAX).unwrap();
        assert!(approx_eq!(f64, hit.dist, 100.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, hit.facing_normal(&ray.dir)[0], -1.0, epsilon = 1e-12));
    }

    #[test]
    fn misses_outside_radius() {
        let s = Sphere::new(P3::origin(), 1.0);
        let ray = Ray::new(P3::new(2.0, 0.0, 10.0), V3::new(0.0, 0.0, -1.0));
        assert!(s.test_hit(&ray, 1e-4, f64::MAX).is_none());
    }
}
