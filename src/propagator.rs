//! Bounce-by-bounce propagation of a ray's spectral covariance.

use crate::covariance::Cov4D;
use crate::scene::Scene;
use crate::*;
use log::*;
use std::fmt;

/// Covariance at the terminal hit of a path, anchored at the hit position.
#[derive(Clone, Debug)]
pub struct PositionCovariance {
    pub pos: P3,
    pub cov: Cov4D,
}

/// Operator applied at a step of the propagation, with the parameter that
/// drove it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operator {
    Travel { distance: f64 },
    Projection { cos: f64 },
    Curvature { k: f64 },
    Cosine { cos: f64 },
    Symmetry,
    Reflection { variance: f64 },
    InverseCurvature { k: f64 },
    InverseProjection { cos: f64 },
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operator::Travel { distance } => write!(f, "After travel of {} meters", distance),
            Operator::Projection { cos } => write!(f, "After projection, cos={}", cos),
            Operator::Curvature { k } => write!(f, "After curvature, k={}", k),
            Operator::Cosine { cos } => write!(f, "After cosine multiplication, cos={}", cos),
            Operator::Symmetry => write!(f, "After symmetry"),
            Operator::Reflection { variance } => {
                write!(f, "After BRDF convolution, variance={}", variance)
            }
            Operator::InverseCurvature { k } => write!(f, "After inverse curvature, k={}", k),
            Operator::InverseProjection { cos } => {
                write!(f, "After inverse projection, cos={}", cos)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct TraceStep {
    pub op: Operator,
    pub cov: Cov4D,
    pub volume: f64,
}

/// Step-by-step record of a propagation.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    steps: Vec<TraceStep>,
    notes: Vec<String>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, op: Operator, cov: &Cov4D) {
        let volume = cov.volume();
        trace!("{}: volume = {:e}", op, volume);
        self.steps.push(TraceStep {
            op,
            cov: *cov,
            volume,
        });
    }

    /// Free-form line appended after the steps, e.g. the resulting filter.
    pub fn note(&mut self, line: String) {
        self.notes.push(line);
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn operators(&self) -> impl Iterator<Item = Operator> + '_ {
        self.steps.iter().map(|s| s.op)
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.notes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.notes.is_empty()
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{}", step.op)?;
            writeln!(f, "{}", step.cov)?;
            writeln!(f, "Volume = {}", step.volume)?;
            writeln!(f)?;
        }
        for line in &self.notes {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Follows `ray` through the scene, transforming `cov` at each interaction,
/// until the hit at `max_depth`. Secondary rays leave along the mirror
/// direction. Returns `None` if the path leaves the scene.
pub fn propagate(
    scene: &Scene,
    ray: &Ray,
    cov: Cov4D,
    depth: usize,
    max_depth: usize,
    trace: &mut Trace,
) -> Option<PositionCovariance> {
    let mut ray = ray.clone();
    let mut cov = cov;
    let mut depth = depth;
    loop {
        let hit = scene.intersect(&ray)?;
        let pos = hit.hit.pos;
        let n = hit.hit.gnorm;

        cov = cov.travel(hit.hit.dist);
        trace.record(
            Operator::Travel {
                distance: hit.hit.dist,
            },
            &cov,
        );

        let cos = n.dot(&cov.z);
        cov = cov.projection(&n);
        trace.record(Operator::Projection { cos }, &cov);

        if depth >= max_depth {
            return Some(PositionCovariance { pos, cov });
        }

        let nl = hit.hit.facing_normal(&ray.dir);
        let wr = math::reflect(&-ray.dir, &nl).normalize();
        let k = hit.object.shape.curvature();
        let variance = hit.material().lobe_variance();

        cov = cov.curvature(k, k);
        trace.record(Operator::Curvature { k }, &cov);
        cov = cov.cosine(1.0);
        trace.record(Operator::Cosine { cos: 1.0 }, &cov);
        cov = cov.symmetry();
        trace.record(Operator::Symmetry, &cov);
        cov = cov.reflection(variance, variance);
        trace.record(Operator::Reflection { variance }, &cov);
        cov = cov.inverse_curvature(k, k);
        trace.record(Operator::InverseCurvature { k: -k }, &cov);
        let cos = n.dot(&wr);
        cov = cov.inverse_projection(&wr);
        trace.record(Operator::InverseProjection { cos }, &cov);

        ray = Ray::new(pos, wr);
        depth += 1;
    }
}
