use nalgebra::{Point3, Vector3};

pub type P3 = Point3<f64>;
pub type V3 = Vector3<f64>;

#[macro_use]
pub mod util;

pub mod accum;
pub mod camera;
pub mod config;
pub mod covariance;
pub mod error;
pub mod example_scenes;
pub mod image;
pub mod material;
pub mod math;
pub mod object;
pub mod parallel;
pub mod pdf;
pub mod propagator;
pub mod radiance;
pub mod ray {
    use crate::*;
    #[derive(Clone, Debug)]
    pub struct Ray {
        pub origin: P3,
        pub dir: V3,
    }

    impl Ray {
        pub fn new(origin: P3, dir: V3) -> Self {
            Ray { origin, dir }
        }

        pub fn at(&self, t: f64) -> P3 {
            self.origin + self.dir * t
        }
    }
}
pub mod reconstruct;
pub mod rgb;
pub mod scene;
pub mod session;
pub mod shape;
pub mod validator;

pub use error::{Error, Result};
pub use math::LocalCoord;
pub use ray::Ray;
pub use rgb::RGB;
