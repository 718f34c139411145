use crate::*;
use camera::Camera;
use material::Material;
use object::SimpleObject;
use scene::Scene;
use shape::Sphere;

/// Index of the glossy sphere whose exponent the session tunes.
pub const TUNABLE_SPHERE: usize = 1;

const GLOSSY_ALBEDO: f64 = 0.999;

/// Two glossy spheres in a Cornell box built from huge spheres, lit through
/// the ceiling. The left sphere is sharp (exponent 1000), the right one
/// rough (exponent 100).
pub fn make_cornell_spheres() -> Scene {
    const R: f64 = 1e5;
    let mut objects = vec![];

    objects.push(SimpleObject {
        shape: Sphere::new(P3::new(27.0, 16.5, 47.0), 16.5),
        material: Material::new_phong(RGB::all(GLOSSY_ALBEDO), 1e3),
        emission: None,
    });
    objects.push(SimpleObject {
        shape: Sphere::new(P3::new(73.0, 16.5, 78.0), 16.5),
        material: Material::new_phong(RGB::all(GLOSSY_ALBEDO), 1e2),
        emission: None,
    });

    let walls = [
        (P3::new(R + 1.0, 40.8, 81.6), RGB::new(0.75, 0.25, 0.25)),
        (P3::new(-R + 99.0, 40.8, 81.6), RGB::new(0.25, 0.25, 0.75)),
        (P3::new(50.0, 40.8, R), RGB::all(0.75)),
        (P3::new(50.0, 40.8, -R + 170.0), RGB::all(0.0)),
        (P3::new(50.0, R, 81.6), RGB::all(0.75)),
        (P3::new(50.0, -R + 81.6, 81.6), RGB::all(0.75)),
    ];
    for (center, color) in walls.iter() {
        objects.push(SimpleObject {
            shape: Sphere::new(*center, R),
            material: Material::new_lambert(*color),
            emission: None,
        });
    }

    objects.push(SimpleObject {
        shape: Sphere::new(P3::new(50.0, 681.6 - 0.27, 81.6), 600.0),
        material: Material::new_lambert(RGB::all(0.0)),
        emission: Some(RGB::all(12.0)),
    });

    Scene::new(objects)
}

/// Camera looking into the box from the open front, pushed 140 units in.
pub fn make_cornell_camera(width: usize, height: usize) -> Camera {
    let dir = V3::new(0.0, -0.042612, -1.0).normalize();
    let origin = P3::new(50.0, 52.0, 295.6) + dir * 140.0;
    Camera::new(origin, dir, 1.2, width, height)
}
