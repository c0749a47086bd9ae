use super::{AnalysisError, check_frames, frame_box};
use crate::core::io::ghosts::GhostHistory;
use crate::core::models::topology::Topology;
use crate::core::models::trajectory::Trajectory;
use tracing::debug;

/// Translates every ghost water out of the periodic cell.
///
/// Frame `i` uses ghost-history frame `i`; each atom of every ghost residue is moved by
/// the sum of the box vectors, so ghosts sit beyond the far corner of the cell and are no
/// longer mistaken for real waters by later stages or by a viewer.
///
/// # Errors
///
/// Returns [`AnalysisError::GhostHistoryTooShort`] when the history has fewer frames than
/// the trajectory, and [`AnalysisError::MissingBox`] for a frame without a cell.
pub fn shift_ghost_waters(
    topology: &Topology,
    trajectory: &mut Trajectory,
    history: &GhostHistory,
) -> Result<(), AnalysisError> {
    check_frames(topology, trajectory)?;
    if history.len() < trajectory.len() {
        return Err(AnalysisError::GhostHistoryTooShort {
            history: history.len(),
            frames: trajectory.len(),
        });
    }

    let mut moved = 0usize;
    for (frame_index, (frame, ghosts)) in trajectory
        .frames
        .iter_mut()
        .zip(&history.frames)
        .enumerate()
    {
        let shift = frame_box(frame, frame_index, topology)?.diagonal();
        for &residue_index in ghosts {
            let residue = topology
                .residue_by_index(residue_index)
                .ok_or(AnalysisError::UnknownResidue(residue_index))?;
            for atom_index in topology.residue_atom_indices(residue) {
                frame.positions[atom_index] += shift;
                moved += 1;
            }
        }
    }
    debug!(frames = trajectory.len(), atoms_moved = moved, "Shifted ghost waters");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::ghosts::GhostSet;
    use crate::core::models::atom::Element;
    use crate::core::models::cell::PeriodicBox;
    use crate::core::models::topology::TopologyBuilder;
    use crate::core::models::trajectory::Frame;
    use nalgebra::{Point3, Vector3};

    fn two_waters() -> Topology {
        let mut builder = TopologyBuilder::new();
        builder.start_chain('W');
        for number in 1..=2 {
            builder.start_residue(number, "HOH").unwrap();
            builder.add_atom("O", 1, Element::O).unwrap();
            builder.add_atom("H1", 2, Element::H).unwrap();
        }
        builder.set_periodic_box(PeriodicBox::orthorhombic(2.0, 2.0, 2.0));
        builder.build()
    }

    fn frame(cell: Option<PeriodicBox>) -> Frame {
        Frame::new(vec![Point3::new(0.5, 0.5, 0.5); 4], cell)
    }

    #[test]
    fn ghost_residues_move_by_the_box_diagonal() {
        let topology = two_waters();
        let mut trajectory = Trajectory::new(vec![
            frame(Some(PeriodicBox::orthorhombic(3.0, 3.0, 3.0))),
            frame(None),
        ]);
        let history = GhostHistory::new(vec![GhostSet::from([1]), GhostSet::from([0, 1])]);

        shift_ghost_waters(&topology, &mut trajectory, &history).unwrap();

        let first = &trajectory.frames[0].positions;
        assert_eq!(first[0], Point3::new(0.5, 0.5, 0.5));
        assert_eq!(first[2], Point3::new(3.5, 3.5, 3.5));
        assert_eq!(first[3], Point3::new(3.5, 3.5, 3.5));
        let second = &trajectory.frames[1].positions;
        assert!(second.iter().all(|p| *p == Point3::new(2.5, 2.5, 2.5)));
    }

    #[test]
    fn triclinic_ghosts_leave_the_cell_along_every_box_vector() {
        let topology = two_waters();
        let cell = PeriodicBox::new(
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(1.0, 3.0, 0.0),
            Vector3::new(0.5, 1.0, 3.0),
        );
        let mut trajectory = Trajectory::new(vec![frame(Some(cell))]);
        let history = GhostHistory::new(vec![GhostSet::from([0])]);

        shift_ghost_waters(&topology, &mut trajectory, &history).unwrap();

        let p = &trajectory.frames[0].positions;
        assert!((p[0] - Point3::new(5.0, 4.5, 3.5)).norm() < 1e-12);
        let fractional = cell.to_fractional(&p[1]).unwrap();
        assert!(fractional.iter().all(|&f| f > 1.0), "{fractional:?}");
        assert_eq!(p[2], Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn short_history_is_rejected() {
        let topology = two_waters();
        let mut trajectory = Trajectory::new(vec![frame(None), frame(None)]);
        let history = GhostHistory::new(vec![GhostSet::new()]);
        assert_eq!(
            shift_ghost_waters(&topology, &mut trajectory, &history),
            Err(AnalysisError::GhostHistoryTooShort {
                history: 1,
                frames: 2
            })
        );
    }

    #[test]
    fn unknown_ghost_residue_is_rejected() {
        let topology = two_waters();
        let mut trajectory = Trajectory::new(vec![frame(None)]);
        let history = GhostHistory::new(vec![GhostSet::from([5])]);
        assert_eq!(
            shift_ghost_waters(&topology, &mut trajectory, &history),
            Err(AnalysisError::UnknownResidue(5))
        );
    }
}
