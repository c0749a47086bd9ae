//! # Trajectory Analysis Module
//!
//! In-memory transforms applied to a recorded GCMC/MD trajectory before visualisation.
//!
//! ## Key Components
//!
//! - [`shift`] - Moves ghost waters out of the periodic cell
//! - [`recentre`] - Centres a reference atom and re-images the remaining residues
//! - [`align`] - Least-squares superposition of every frame onto the first
//! - [`sphere`] - Positions of the GCMC sphere over time
//! - [`cluster`] - Hydration sites from water oxygens inside the sphere
//!
//! Each transform is pure: it only touches the trajectory it is handed and produces the
//! same result for the same input, so the workflow layer can persist every intermediate
//! result and chain the stages.

use crate::core::models::cell::PeriodicBox;
use crate::core::models::selection::SelectionError;
use crate::core::models::topology::Topology;
use crate::core::models::trajectory::{Frame, Trajectory};
use thiserror::Error;

pub mod align;
pub mod cluster;
pub mod recentre;
pub mod shift;
pub mod sphere;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Trajectory has no frames")]
    EmptyTrajectory,
    #[error("Ghost history has {history} frames but the trajectory has {frames}")]
    GhostHistoryTooShort { history: usize, frames: usize },
    #[error("Frame {0} has no periodic box and the topology defines none")]
    MissingBox(usize),
    #[error("Frame {frame} has {found} atoms, expected {expected}")]
    AtomCountMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[error("Ghost residue index {0} does not exist in the topology")]
    UnknownResidue(usize),
    #[error("No atoms are available for alignment")]
    NoAlignmentAtoms,
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Box of frame `index`, falling back to the topology's box.
pub(crate) fn frame_box(
    frame: &Frame,
    index: usize,
    topology: &Topology,
) -> Result<PeriodicBox, AnalysisError> {
    frame
        .periodic_box
        .or_else(|| topology.periodic_box().copied())
        .ok_or(AnalysisError::MissingBox(index))
}

/// Fails unless the trajectory is non-empty and every frame matches the topology.
pub(crate) fn check_frames(topology: &Topology, trajectory: &Trajectory) -> Result<(), AnalysisError> {
    if trajectory.is_empty() {
        return Err(AnalysisError::EmptyTrajectory);
    }
    let expected = topology.atom_count();
    for (frame_index, frame) in trajectory.frames.iter().enumerate() {
        if frame.positions.len() != expected {
            return Err(AnalysisError::AtomCountMismatch {
                frame: frame_index,
                expected,
                found: frame.positions.len(),
            });
        }
    }
    Ok(())
}
