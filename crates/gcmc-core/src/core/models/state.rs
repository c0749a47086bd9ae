use super::cell::PeriodicBox;
use nalgebra::{Point3, Vector3};

/// A checkpointed simulation state read from a restart file.
///
/// Positions are in nm, velocities in nm/ps and `time` in ps. Velocities and the box are
/// optional because restart files may omit either.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartState {
    pub title: String,
    pub positions: Vec<Point3<f64>>,
    pub velocities: Option<Vec<Vector3<f64>>>,
    pub periodic_box: Option<PeriodicBox>,
    pub time: Option<f64>,
}

impl RestartState {
    pub fn new(positions: Vec<Point3<f64>>) -> Self {
        Self {
            title: String::new(),
            positions,
            velocities: None,
            periodic_box: None,
            time: None,
        }
    }

    pub fn with_velocities(mut self, velocities: Vec<Vector3<f64>>) -> Self {
        self.velocities = Some(velocities);
        self
    }

    pub fn with_box(mut self, periodic_box: PeriodicBox) -> Self {
        self.periodic_box = Some(periodic_box);
        self
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn particle_count(&self) -> usize {
        self.positions.len()
    }
}
