//! Render context of an interactive-style run: the scene, the three images
//! with their progressive state, the query pointer and the display toggles.

use crate::accum::running_mean;
use crate::camera::Camera;
use crate::config::Config;
use crate::covariance::Cov4D;
use crate::example_scenes::TUNABLE_SPHERE;
use crate::image::{Buffer, Image};
use crate::parallel::{stream_seed, ParallelFor};
use crate::propagator::{propagate, PositionCovariance, Trace};
use crate::radiance::radiance;
use crate::reconstruct::{filter_image, BruteForce, FilterMode, FilterParams};
use crate::scene::Scene;
use crate::validator::sample_pool;
use crate::*;
use log::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// Keys separating the random streams of the passes.
const BACKGROUND_STREAM: u64 = 0;
const REFERENCE_STREAM: u64 = 1;

/// Half length of the pointer crosshair in the export, in pixels.
const CROSSHAIR: usize = 4;

pub struct Session {
    scene: Scene,
    camera: Camera,
    par: ParallelFor,
    seed: u64,
    samples: usize,
    max_depth: usize,

    background: Buffer,
    covariance: Buffer,
    reference: Buffer,
    cov_scale: f32,
    ref_scale: f32,
    background_passes: usize,
    brute_force: BruteForce,
    filter: Option<FilterParams>,
    trace: Trace,

    pointer: (f64, f64),
    mode: FilterMode,
    generate_background: bool,
    display_background: bool,
    generate_covariance: bool,
    generate_reference: bool,
    frame: u64,
}

impl Session {
    pub fn new(mut scene: Scene, camera: Camera, config: &Config) -> Self {
        if let Some(exponent) = config.exponent {
            set_exponent(&mut scene, exponent);
        }
        let (w, h) = (camera.width(), camera.height());
        Session {
            scene,
            camera,
            par: ParallelFor::new(config.threads),
            seed: config.seed,
            samples: config.samples,
            max_depth: config.max_depth,
            background: Buffer::new(w, h),
            covariance: Buffer::new(w, h),
            reference: Buffer::new(w, h),
            cov_scale: 1.0,
            ref_scale: 1.0,
            background_passes: 0,
            brute_force: BruteForce::new(),
            filter: None,
            trace: Trace::new(),
            pointer: config.pointer,
            mode: config.mode,
            generate_background: config.generate_background,
            display_background: config.display_background,
            generate_covariance: config.generate_covariance,
            generate_reference: config.generate_reference,
            frame: 0,
        }
    }

    /// Renders every enabled image once.
    pub fn frame(&mut self) {
        info!("frame {}", self.frame);
        if self.generate_background {
            self.render_background();
        }
        if self.generate_covariance {
            self.render_covariance();
        }
        if self.generate_reference {
            self.render_brute_force();
        }
        self.frame += 1;
    }

    /// One jittered path per pixel folded into the grey background.
    pub fn render_background(&mut self) {
        let (scene, camera) = (&self.scene, &self.camera);
        let (seed, frame, passes, max_depth) =
            (self.seed, self.frame, self.background_passes, self.max_depth);
        let width = self.background.w();
        self.par
            .for_each_row(self.background.pixels_mut(), width, |y, row| {
                let mut rng = SmallRng::seed_from_u64(stream_seed(
                    seed,
                    &[BACKGROUND_STREAM, frame, y as u64],
                ));
                for (x, v) in row.iter_mut().enumerate() {
                    let dx: f64 = rng.gen();
                    let dy: f64 = rng.gen();
                    let ray = camera.ray_through(x as f64 + dx, y as f64 + dy);
                    let l = radiance(scene, &ray, &mut rng, max_depth).mean() as f32;
                    *v = running_mean(*v, passes, l, 1);
                }
            });
        self.background_passes += 1;
        debug!("background pass {}", self.background_passes);
    }

    /// Propagates the covariance of the pointed pixel and redraws the
    /// analytic filter. A degenerate filter keeps the previous image.
    pub fn render_covariance(&mut self) {
        self.trace.clear();
        let (px, py) = self.camera.pixel_at(self.pointer);
        let ray = self.camera.pixel_center_ray(px, py);
        let cov = Cov4D::pixel(&ray.dir);
        let pc = match propagate(&self.scene, &ray, cov, 0, self.max_depth, &mut self.trace) {
            Some(pc) => pc,
            None => {
                warn!("no covariance for pixel ({}, {}): the path escapes", px, py);
                self.filter = None;
                return;
            }
        };
        self.draw_filter(&pc, (px, py));
    }

    /// Turns the covariance at the end of the query path into the analytic
    /// filter image. On a degenerate filter the image is left as it was.
    fn draw_filter(&mut self, pc: &PositionCovariance, (px, py): (usize, usize)) {
        self.trace.note(format!("{}", pc.cov));
        self.trace.note(format!("Volume = {}", pc.cov.volume()));

        let params = match FilterParams::from_covariance(pc) {
            Ok(params) => params,
            Err(e) => {
                warn!("{} at pixel ({}, {})", e, px, py);
                self.trace.note(format!("Error: {}", e));
                self.filter = None;
                return;
            }
        };
        let (sxx, sxy, syy) = params.spatial_filter();
        let (dx, dy) = params.extent();
        self.trace
            .note(format!("Spatial filter = [{}, {}; {}, {}]", sxx, sxy, sxy, syy));
        self.trace
            .note(format!("|Dx| = {}, |Dy| = {}", dx.norm(), dy.norm()));
        debug!("spatial filter ({}, {}, {})", sxx, sxy, syy);

        filter_image(
            &params,
            self.mode,
            &self.scene,
            &self.camera,
            &mut self.covariance,
            &self.par,
        );
        self.filter = Some(params);
    }

    /// One progressive pass of the density estimate around the pointed
    /// pixel.
    pub fn render_brute_force(&mut self) {
        let pixel = self.camera.pixel_at(self.pointer);
        let pool = sample_pool(
            &self.scene,
            &self.camera,
            pixel,
            self.samples,
            self.max_depth,
            &self.par,
            stream_seed(self.seed, &[REFERENCE_STREAM, self.frame]),
        );
        self.ref_scale = self.brute_force.pass(
            &pool,
            self.samples,
            &self.scene,
            &self.camera,
            &mut self.reference,
            &self.par,
        );
        debug!("brute force scale {}", self.ref_scale);
    }

    pub fn set_pointer(&mut self, pointer: (f64, f64)) {
        let pointer = (pointer.0.clamp(0.0, 1.0), pointer.1.clamp(0.0, 1.0));
        if pointer != self.pointer {
            self.pointer = pointer;
            self.brute_force.reset();
        }
    }

    pub fn toggle_background_generation(&mut self) {
        self.generate_background = !self.generate_background;
    }

    pub fn toggle_background_display(&mut self) {
        self.display_background = !self.display_background;
    }

    /// Stops or resumes the analytic filter; its image starts blank again.
    pub fn toggle_covariance(&mut self) {
        self.covariance.clear();
        self.generate_covariance = !self.generate_covariance;
    }

    pub fn toggle_brute_force(&mut self) {
        self.generate_reference = !self.generate_reference;
    }

    pub fn toggle_filter_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Multiplies the tunable sphere's exponent by ten.
    pub fn increase_sharpness(&mut self) {
        if let Some(e) = self.exponent() {
            self.change_exponent(e * 10.0);
        }
    }

    /// Divides the tunable sphere's exponent by ten, down to 1.
    pub fn decrease_sharpness(&mut self) {
        if let Some(e) = self.exponent() {
            self.change_exponent((e / 10.0).max(1.0));
        }
    }

    fn change_exponent(&mut self, exponent: f64) {
        set_exponent(&mut self.scene, exponent);
        info!("exponent of sphere {} is now {}", TUNABLE_SPHERE, exponent);
        self.background_passes = 0;
        self.brute_force.reset();
    }

    pub fn exponent(&self) -> Option<f64> {
        self.scene
            .objects()
            .get(TUNABLE_SPHERE)
            .map(|o| o.material.exponent())
    }

    /// Composes the enabled images and writes them as an RGB OpenEXR file.
    pub fn export(&self, path: &str) -> Result<()> {
        let (w, h) = (self.background.w(), self.background.h());
        let (px, py) = self.camera.pixel_at(self.pointer);
        let show_pointer = self.generate_covariance || self.generate_reference;
        let mut image = Image::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let bg = if self.display_background {
                    self.background.at(x, y) as f64
                } else {
                    0.0
                };
                let mut c = RGB::all(bg);
                if self.generate_covariance {
                    c.r += (self.cov_scale * self.covariance.at(x, y)) as f64;
                }
                if self.generate_reference {
                    c.g += (self.ref_scale * self.reference.at(x, y)) as f64;
                }
                let on_cross = (y == py && x.abs_diff(px) < CROSSHAIR)
                    || (x == px && y.abs_diff(py) < CROSSHAIR);
                if show_pointer && on_cross {
                    c.b += 1.0;
                }
                *image.at_mut(x, y) = c;
            }
        }
        image.write_exr(path)?;
        info!("exported {}", path);
        Ok(())
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn filter(&self) -> Option<&FilterParams> {
        self.filter.as_ref()
    }

    pub fn background(&self) -> &Buffer {
        &self.background
    }

    pub fn covariance(&self) -> &Buffer {
        &self.covariance
    }

    pub fn reference(&self) -> &Buffer {
        &self.reference
    }

    pub fn background_scale(&self) -> f32 {
        1.0
    }

    pub fn cov_scale(&self) -> f32 {
        self.cov_scale
    }

    pub fn ref_scale(&self) -> f32 {
        self.ref_scale
    }

    pub fn background_passes(&self) -> usize {
        self.background_passes
    }

    pub fn brute_force(&self) -> &BruteForce {
        &self.brute_force
    }

    pub fn pointer(&self) -> (f64, f64) {
        self.pointer
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }
}

fn set_exponent(scene: &mut Scene, exponent: f64) {
    match scene.object_mut(TUNABLE_SPHERE) {
        Some(object) => object.material = object.material.with_exponent(exponent),
        None => warn!("scene has no sphere {} to tune", TUNABLE_SPHERE),
    }
}
