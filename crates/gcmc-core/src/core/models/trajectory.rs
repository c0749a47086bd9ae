use super::cell::PeriodicBox;
use nalgebra::Point3;

/// One recorded snapshot: coordinates (nm) of every atom and the cell at that moment.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub positions: Vec<Point3<f64>>,
    pub periodic_box: Option<PeriodicBox>,
}

impl Frame {
    pub fn new(positions: Vec<Point3<f64>>, periodic_box: Option<PeriodicBox>) -> Self {
        Self {
            positions,
            periodic_box,
        }
    }
}

/// Frames recorded over a single topology, in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub frames: Vec<Frame>,
}

impl Trajectory {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of atoms per frame, taken from the first frame.
    pub fn atom_count(&self) -> Option<usize> {
        self.frames.first().map(|frame| frame.positions.len())
    }
}
