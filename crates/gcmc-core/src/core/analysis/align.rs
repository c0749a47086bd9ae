use super::{AnalysisError, check_frames};
use crate::core::models::topology::Topology;
use crate::core::models::trajectory::Trajectory;
use nalgebra::{Matrix3, Point3, Vector3};
use tracing::debug;

/// Atom name used to select the protein backbone for superposition.
pub const ALIGNMENT_ATOM_NAME: &str = "CA";

/// Rigid-body transform `x' = R (x - from) + to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    pub rotation: Matrix3<f64>,
    pub from: Vector3<f64>,
    pub to: Vector3<f64>,
}

impl Superposition {
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * (point.coords - self.from) + self.to)
    }
}

/// Indices of the protein `CA` atoms of `topology`.
pub fn alignment_atoms(topology: &Topology) -> Vec<usize> {
    topology
        .atoms()
        .filter(|atom| atom.name == ALIGNMENT_ATOM_NAME)
        .filter(|atom| topology.residue_of(atom).is_some_and(|r| r.is_protein()))
        .map(|atom| atom.index)
        .collect()
}

/// Least-squares superposition of `mobile` onto `reference` (Kabsch algorithm).
///
/// Both slices must be the same, non-zero length. Reflections are excluded, so the
/// returned rotation always has determinant +1.
pub fn kabsch(reference: &[Point3<f64>], mobile: &[Point3<f64>]) -> Option<Superposition> {
    if reference.is_empty() || reference.len() != mobile.len() {
        return None;
    }
    let n = reference.len() as f64;
    let to = reference.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n;
    let from = mobile.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n;

    let covariance = mobile
        .iter()
        .zip(reference)
        .fold(Matrix3::zeros(), |acc, (p, q)| {
            acc + (p.coords - from) * (q.coords - to).transpose()
        });

    let svd = covariance.svd(true, true);
    let (u, v_t) = (svd.u?, svd.v_t?);
    let v = v_t.transpose();
    let d = (v * u.transpose()).determinant().signum();
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d));
    let rotation = v * correction * u.transpose();

    Some(Superposition { rotation, from, to })
}

fn rmsd(a: &[Point3<f64>], b: &[Point3<f64>]) -> f64 {
    let sum: f64 = a.iter().zip(b).map(|(p, q)| (p - q).norm_squared()).sum();
    (sum / a.len() as f64).sqrt()
}

/// Superimposes every frame onto frame 0 using the protein `CA` atoms.
///
/// The whole frame is moved by the transform fitted on the selection. Box vectors are
/// left unchanged.
///
/// # Return
///
/// The RMSD (nm) of the selection to frame 0 for each frame after fitting.
pub fn align_to_first_frame(
    topology: &Topology,
    trajectory: &mut Trajectory,
) -> Result<Vec<f64>, AnalysisError> {
    check_frames(topology, trajectory)?;
    let selection = alignment_atoms(topology);
    if selection.is_empty() {
        return Err(AnalysisError::NoAlignmentAtoms);
    }

    let reference: Vec<Point3<f64>> = selection
        .iter()
        .map(|&i| trajectory.frames[0].positions[i])
        .collect();

    let mut deviations = Vec::with_capacity(trajectory.len());
    for frame in trajectory.frames.iter_mut() {
        let mobile: Vec<Point3<f64>> = selection.iter().map(|&i| frame.positions[i]).collect();
        let fit = kabsch(&reference, &mobile).ok_or(AnalysisError::NoAlignmentAtoms)?;
        for position in frame.positions.iter_mut() {
            *position = fit.apply(position);
        }
        let fitted: Vec<Point3<f64>> = selection.iter().map(|&i| frame.positions[i]).collect();
        deviations.push(rmsd(&reference, &fitted));
    }
    debug!(
        frames = trajectory.len(),
        atoms = selection.len(),
        max_rmsd = deviations.iter().cloned().fold(0.0, f64::max),
        "Aligned trajectory"
    );
    Ok(deviations)
}
