use crate::*;

/// Offset keeping secondary rays from re-hitting their own surface.
pub const RAY_EPSILON: f64 = 1e-4;

pub struct Scene {
    objects: object::ObjectList,
}

impl Scene {
    pub fn new(objects: Vec<object::SimpleObject>) -> Self {
        Scene {
            objects: object::ObjectList::new(objects),
        }
    }

    pub fn objects(&self) -> &[object::SimpleObject] {
        &self.objects.objects
    }

    pub fn object_mut(&mut self, obj_ix: usize) -> Option<&mut object::SimpleObject> {
        self.objects.objects.get_mut(obj_ix)
    }

    pub fn test_hit(&self, ray: &Ray, tnear: f64, tfar: f64) -> Option<object::ObjectHit> {
        self.objects.test_hit(ray, tnear, tfar)
    }

    /// Nearest intersection along `ray`, `None` on a miss.
    pub fn intersect(&self, ray: &Ray) -> Option<object::ObjectHit> {
        self.test_hit(ray, RAY_EPSILON, f64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use material::Material;
    use object::SimpleObject;
    use shape::Sphere;

    fn ball(x: f64) -> SimpleObject {
        SimpleObject {
            shape: Sphere::new(P3::new(x, 0.0, 0.0), 1.0),
            material: Material::new_lambert(RGB::all(0.5)),
            emission: None,
        }
    }

    #[test]
    fn intersect_returns_nearest_object() {
        let scene = Scene::new(vec![ball(10.0), ball(5.0), ball(20.0)]);
        let ray = Ray::new(P3::origin(), V3::new(1.0, 0.0, 0.0));
        let hit = scene.intersect(&ray).unwrap();
        assert_eq!(hit.obj_ix, 1);
        assert!((hit.hit.dist - 4.0).abs() < 1e-9);
    }

    #[test]
    fn intersect_misses_empty_directions() {
        let scene = Scene::new(vec![ball(10.0)]);
        let ray = Ray::new(P3::origin(), V3::new(-1.0, 0.0, 0.0));
        assert!(scene.intersect(&ray).is_none());
    }
}
