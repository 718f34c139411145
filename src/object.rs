use crate::*;

/// An intersection together with the object it belongs to.
pub struct ObjectHit<'a> {
    pub hit: shape::Hit,
    pub obj_ix: usize,
    pub object: &'a SimpleObject,
}

impl<'a> ObjectHit<'a> {
    pub fn material(&self) -> &'a material::Material {
        &self.object.material
    }
}

#[derive(Clone, Debug)]
pub struct SimpleObject {
    pub shape: shape::Sphere,
    pub material: material::Material,
    pub emission: Option<rgb::RGB>,
}

#[derive(Clone, Debug, Default)]
pub struct ObjectList {
    pub objects: Vec<SimpleObject>,
}

impl ObjectList {
    pub fn new(objects: Vec<SimpleObject>) -> Self {
        ObjectList { objects }
    }

    pub fn test_hit(&self, ray: &ray::Ray, tnear: f64, mut tfar: f64) -> Option<ObjectHit> {
        let mut nearest = None::<ObjectHit>;
        for (obj_ix, object) in self.objects.iter().enumerate() {
            if let Some(hit) = object.shape.test_hit(ray, tnear, tfar) {
                tfar = hit.dist;
                nearest = Some(ObjectHit {
                    hit,
                    obj_ix,
                    object,
                });
            }
        }
        nearest
    }
}
