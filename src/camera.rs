use crate::*;

/// Pinhole camera spanning the film with two screen vectors.
#[derive(Clone, Debug)]
pub struct Camera {
    origin: P3,
    dir: V3,
    cx: V3,
    cy: V3,
    width: usize,
    height: usize,
}

impl Camera {
    /// `fov` is the film's vertical extent at unit distance.
    pub fn new(origin: P3, dir: V3, fov: f64, width: usize, height: usize) -> Self {
        let dir = dir.normalize();
        let right = dir.cross(&V3::y()).normalize();
        let cx = right * (width as f64 * fov / height as f64);
        let cy = cx.cross(&dir).normalize() * fov;
        Camera {
            origin,
            dir,
            cx,
            cy,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn origin(&self) -> &P3 {
        &self.origin
    }

    /// Ray through film coordinates measured in pixels, `(x + 0.5, y + 0.5)`
    /// being the centre of pixel `(x, y)`.
    pub fn ray_through(&self, px: f64, py: f64) -> Ray {
        let d = self.cx * (px / self.width as f64 - 0.5)
            + self.cy * (py / self.height as f64 - 0.5)
            + self.dir;
        Ray::new(self.origin, d.normalize())
    }

    pub fn pixel_center_ray(&self, x: usize, y: usize) -> Ray {
        self.ray_through(x as f64 + 0.5, y as f64 + 0.5)
    }

    /// Pixel under a pointer given in normalized `[0, 1]²` film coordinates.
    pub fn pixel_at(&self, pointer: (f64, f64)) -> (usize, usize) {
        let clamp = |v: f64, n: usize| ((v * n as f64).max(0.0) as usize).min(n - 1);
        (clamp(pointer.0, self.width), clamp(pointer.1, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn centre_ray_follows_view_direction() {
        let cam = Camera::new(P3::origin(), V3::new(0.0, 0.0, -1.0), 1.2, 64, 64);
        let r = cam.ray_through(32.0, 32.0);
        assert!(approx_eq!(f64, r.dir[2], -1.0, epsilon = 1e-12));
    }

    #[test]
    fn film_axes_point_right_and_up() {
        let cam = Camera::new(P3::origin(), V3::new(0.0, 0.0, -1.0), 1.2, 64, 64);
        assert!(cam.pixel_center_ray(63, 32).dir[0] > 0.0);
        assert!(cam.pixel_center_ray(32, 63).dir[1] > 0.0);
    }

    #[test]
    fn pointer_is_clamped_to_film() {
        let cam = Camera::new(P3::origin(), V3::new(0.0, 0.0, -1.0), 1.2, 10, 20);
        assert_eq!(cam.pixel_at((0.5, 0.5)), (5, 10));
        assert_eq!(cam.pixel_at((1.0, 1.0)), (9, 19));
        assert_eq!(cam.pixel_at((-0.2, 0.0)), (0, 0));
    }
}
