use crate::error::{Error, Result};
use crate::*;

/// Scalar image, row-major, row 0 at the bottom of the film.
#[derive(Clone, Debug)]
pub struct Buffer {
    w: usize,
    h: usize,
    buf: Vec<f32>,
}

impl Buffer {
    pub fn new(w: usize, h: usize) -> Self {
        Buffer {
            w,
            h,
            buf: vec![0.0; w * h],
        }
    }

    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.buf[y * self.w + x]
    }

    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut f32 {
        &mut self.buf[y * self.w + x]
    }

    pub fn pixels(&self) -> &[f32] {
        &self.buf
    }

    pub fn pixels_mut(&mut self) -> &mut [f32] {
        &mut self.buf
    }

    pub fn clear(&mut self) {
        self.buf.iter_mut().for_each(|v| *v = 0.0);
    }

    pub fn w(&self) -> usize {
        self.w
    }
    pub fn h(&self) -> usize {
        self.h
    }
}

pub struct Image {
    w: usize,
    h: usize,
    buf: Vec<RGB>,
}

impl Image {
    pub fn new(w: usize, h: usize) -> Self {
        Image {
            w,
            h,
            buf: vec![RGB::all(0.0); w * h],
        }
    }

    pub fn at(&self, x: usize, y: usize) -> &RGB {
        &self.buf[y * self.w + x]
    }

    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut RGB {
        &mut self.buf[y * self.w + x]
    }

    /// Writes a float RGB OpenEXR file, flipping rows so the film's top comes
    /// first.
    pub fn write_exr(&self, filename: &str) -> Result<()> {
        let (w, h) = (self.w, self.h);
        exr::prelude::write_rgb_file(filename, w, h, |x, y| {
            let c = self.at(x, h - 1 - y);
            (c.r as f32, c.g as f32, c.b as f32)
        })
        .map_err(|source| Error::Export {
            path: filename.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_row_major() {
        let mut b = Buffer::new(4, 3);
        *b.at_mut(1, 2) = 5.0;
        assert_eq!(b.pixels()[2 * 4 + 1], 5.0);
        b.clear();
        assert!(b.pixels().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn exr_round_trip_to_temp_dir() {
        let mut img = Image::new(8, 4);
        *img.at_mut(2, 3) = RGB::new(1.0, 0.5, 0.25);
        let path = std::env::temp_dir().join("covtrace_image_test.exr");
        let path = path.to_string_lossy().to_string();
        img.write_exr(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn exr_export_failure_is_reported() {
        let img = Image::new(2, 2);
        let err = img.write_exr("/nonexistent-dir/covtrace/out.exr").unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
    }
}
