//! Progressive accumulators shared by the background and brute-force passes.

use log::*;
use std::sync::Mutex;

/// Incremental mean: folds `sum`, the total of `added` new samples, into a
/// mean previously taken over `count` samples.
pub fn running_mean(mean: f32, count: usize, sum: f32, added: usize) -> f32 {
    let total = count + added;
    if total == 0 {
        return mean;
    }
    (mean * count as f32 + sum) / total as f32
}

/// Maximum reduced across workers; each worker folds in its local maximum
/// once, inside a single critical section.
#[derive(Debug, Default)]
pub struct SharedMax(Mutex<f32>);

impl SharedMax {
    pub fn new() -> Self {
        Self::default()
    }

    /// A lock poisoned by a panicking worker is taken over, not skipped.
    pub fn merge(&self, local: f32) {
        let mut max = self.0.lock().unwrap_or_else(|e| {
            warn!("shared maximum poisoned by a panicked worker");
            e.into_inner()
        });
        *max = max.max(local);
    }

    pub fn get(&self) -> f32 {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Kernel radius of the progressive density estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bandwidth {
    radius: f64,
    passes: usize,
}

impl Default for Bandwidth {
    fn default() -> Self {
        Bandwidth {
            radius: 1.0,
            passes: 0,
        }
    }
}

impl Bandwidth {
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Shrinks the radius after a completed pass by `sqrt((n + 0.8)/(n + 1))`.
    pub fn advance(&mut self) {
        let n = self.passes as f64;
        self.radius *= ((n + 0.8) / (n + 1.0)).sqrt();
        self.passes += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
