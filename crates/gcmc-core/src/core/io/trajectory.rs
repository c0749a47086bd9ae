use super::pdb::{PdbError, PdbFile};
use crate::core::models::topology::Topology;
use crate::core::models::trajectory::Trajectory;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("PDB trajectory error: {0}")]
    Pdb(#[from] PdbError),
    #[error("Trajectory frames hold {found} atoms but the topology has {expected}")]
    AtomCountMismatch { expected: usize, found: usize },
    #[error("No trajectory format is available for '{0}'")]
    UnsupportedFormat(PathBuf),
}

/// A trajectory file codec.
///
/// Codecs only move coordinates; the topology always comes from the caller so that
/// formats without residue information can be plugged in.
pub trait TrajectoryFormat {
    fn name(&self) -> &'static str;

    fn read(&self, path: &Path, topology: &Topology) -> Result<Trajectory, TrajectoryError>;

    fn write(
        &self,
        path: &Path,
        topology: &Topology,
        trajectory: &Trajectory,
        remarks: &[String],
    ) -> Result<(), TrajectoryError>;
}

/// Multi-model PDB trajectories.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdbTrajectoryFormat;

impl TrajectoryFormat for PdbTrajectoryFormat {
    fn name(&self) -> &'static str {
        "pdb"
    }

    fn read(&self, path: &Path, topology: &Topology) -> Result<Trajectory, TrajectoryError> {
        let (_, trajectory) = PdbFile::read_from_path(path)?;
        check_atom_count(topology, &trajectory)?;
        Ok(trajectory)
    }

    fn write(
        &self,
        path: &Path,
        topology: &Topology,
        trajectory: &Trajectory,
        remarks: &[String],
    ) -> Result<(), TrajectoryError> {
        check_atom_count(topology, trajectory)?;
        PdbFile::write_trajectory_to_path(path, topology, trajectory, remarks)?;
        Ok(())
    }
}

/// Picks a codec from the file extension.
pub fn format_for_path(path: &Path) -> Result<Box<dyn TrajectoryFormat>, TrajectoryError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdb") | Some("ent") => Ok(Box::new(PdbTrajectoryFormat)),
        _ => Err(TrajectoryError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn check_atom_count(topology: &Topology, trajectory: &Trajectory) -> Result<(), TrajectoryError> {
    let expected = topology.atom_count();
    match trajectory
        .frames
        .iter()
        .map(|frame| frame.positions.len())
        .find(|&found| found != expected)
    {
        Some(found) => Err(TrajectoryError::AtomCountMismatch { expected, found }),
        None => Ok(()),
    }
}
