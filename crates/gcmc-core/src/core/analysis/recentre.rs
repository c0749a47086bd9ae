use super::{AnalysisError, check_frames, frame_box};
use crate::core::io::ghosts::{GhostHistory, GhostSet};
use crate::core::models::selection::AtomSelector;
use crate::core::models::topology::Topology;
use crate::core::models::trajectory::Trajectory;
use tracing::debug;

/// Centres every frame on one reference atom and re-images the rest of the system.
///
/// Each frame is translated so the reference atom sits at the centre of the cell. Every
/// residue is then wrapped back into the cell as a whole, using its first atom to decide
/// the image, so molecules are never split across the boundary. Residues listed in the
/// frame's ghost set are left where the translation put them, keeping shifted ghosts
/// outside the cell.
///
/// # Arguments
///
/// * `topology` - Topology of the trajectory.
/// * `trajectory` - Frames to transform in place.
/// * `reference` - Atom to centre on.
/// * `ghosts` - Optional per-frame ghost sets; must cover every frame when given.
pub fn recentre(
    topology: &Topology,
    trajectory: &mut Trajectory,
    reference: &AtomSelector,
    ghosts: Option<&GhostHistory>,
) -> Result<(), AnalysisError> {
    check_frames(topology, trajectory)?;
    let reference_index = reference.resolve(topology)?;
    if let Some(history) = ghosts {
        if history.len() < trajectory.len() {
            return Err(AnalysisError::GhostHistoryTooShort {
                history: history.len(),
                frames: trajectory.len(),
            });
        }
    }

    let residues: Vec<Vec<usize>> = topology
        .residues()
        .map(|residue| topology.residue_atom_indices(residue))
        .collect();
    let no_ghosts = GhostSet::new();

    for (frame_index, frame) in trajectory.frames.iter_mut().enumerate() {
        let cell = frame_box(frame, frame_index, topology)?;
        let translation = cell.centre() - frame.positions[reference_index];
        for position in frame.positions.iter_mut() {
            *position += translation;
        }

        let frame_ghosts = ghosts
            .and_then(|history| history.frames.get(frame_index))
            .unwrap_or(&no_ghosts);
        for (residue_index, atoms) in residues.iter().enumerate() {
            if frame_ghosts.contains(&residue_index) {
                continue;
            }
            let Some(&anchor) = atoms.first() else {
                continue;
            };
            let shift = cell.wrap_shift(&frame.positions[anchor]);
            if shift != nalgebra::Vector3::zeros() {
                for &atom_index in atoms {
                    frame.positions[atom_index] += shift;
                }
            }
        }
    }
    debug!(frames = trajectory.len(), reference = %reference, "Recentred trajectory");
    Ok(())
}
