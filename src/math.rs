use nalgebra::*;
pub type P3 = Point3<f64>;
pub type V3 = Vector3<f64>;

pub struct LocalCoord {
    l2w: Isometry3<f64>,
    w2l: Isometry3<f64>,
}

impl LocalCoord {
    pub fn new_zx(o: &P3, z: &V3, x_like: &V3) -> Self {
        Self::new_zy(o, z, &z.cross(x_like))
    }

    pub fn new_zy(o: &P3, z: &V3, y_like: &V3) -> Self {
        let tr = Translation3::from(o.coords);
        let rot = UnitQuaternion::face_towards(z, y_like);
        Self::from_iso(Isometry3::from_parts(tr, rot))
    }

    /// Frame around `z` with an arbitrary but stable tangent.
    pub fn new_z(o: &P3, z: &V3) -> Self {
        let (x, _) = tangent_basis(z);
        Self::new_zx(o, z, &x)
    }

    pub fn from_iso(l2w: Isometry3<f64>) -> Self {
        let w2l = l2w.inverse();
        LocalCoord { l2w, w2l }
    }

    //local to world
    pub fn l2w(&self) -> &Isometry3<f64> {
        &self.l2w
    }

    //world to local
    pub fn w2l(&self) -> &Isometry3<f64> {
        &self.w2l
    }
}

/// Two unit vectors completing `z` (assumed normalized) into a right-handed
/// frame `(x, y, z)`.
pub fn tangent_basis(z: &V3) -> (V3, V3) {
    let x_approx = if z[0].abs() < 0.5 {
        V3::new(1.0, 0.0, 0.0)
    } else {
        V3::new(0.0, 1.0, 0.0)
    };
    let x = (x_approx - x_approx.dot(z) * z).normalize();
    let y = z.cross(&x);
    (x, y)
}

/// Mirror direction of `w` (pointing away from the surface) about `n`.
pub fn reflect(w: &V3, n: &V3) -> V3 {
    2.0 * w.dot(n) * n - w
}
