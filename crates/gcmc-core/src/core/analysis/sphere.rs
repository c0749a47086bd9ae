use super::{AnalysisError, check_frames};
use crate::core::io::pdb::{PdbAtomRecord, PdbFile};
use crate::core::models::selection::AtomSelector;
use crate::core::models::topology::Topology;
use crate::core::models::trajectory::Trajectory;
use crate::core::units::nm_to_angstrom;
use nalgebra::{Point3, Vector3};
use std::io::{self, Write};

/// Mean position of the atoms at `indices`.
pub fn sphere_centre(positions: &[Point3<f64>], indices: &[usize]) -> Point3<f64> {
    if indices.is_empty() {
        return Point3::origin();
    }
    let sum: Vector3<f64> = indices.iter().map(|&i| positions[i].coords).sum();
    Point3::from(sum / indices.len() as f64)
}

/// Resolves each selector to an atom index.
pub fn resolve_reference_atoms(
    topology: &Topology,
    references: &[AtomSelector],
) -> Result<Vec<usize>, AnalysisError> {
    if references.is_empty() {
        return Err(AnalysisError::InvalidParameter(
            "at least one sphere reference atom is required".to_string(),
        ));
    }
    references
        .iter()
        .map(|selector| selector.resolve(topology).map_err(AnalysisError::from))
        .collect()
}

/// Positions of the GCMC sphere over a trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereTrajectory {
    /// Sphere radius in nm.
    pub radius: f64,
    /// Sphere centre for every written model, in nm.
    pub centres: Vec<Point3<f64>>,
}

impl SphereTrajectory {
    /// Computes the sphere centre for every frame.
    ///
    /// # Arguments
    ///
    /// * `initial_positions` - When given, the centre computed from these coordinates is
    ///   prepended as an extra first model, matching the structure a viewer loads before
    ///   the trajectory.
    pub fn from_trajectory(
        topology: &Topology,
        trajectory: &Trajectory,
        references: &[AtomSelector],
        radius: f64,
        initial_positions: Option<&[Point3<f64>]>,
    ) -> Result<Self, AnalysisError> {
        if radius <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "sphere radius must be positive (got {} nm)",
                radius
            )));
        }
        check_frames(topology, trajectory)?;
        let indices = resolve_reference_atoms(topology, references)?;

        let mut centres = Vec::with_capacity(trajectory.len() + 1);
        if let Some(positions) = initial_positions {
            if positions.len() != topology.atom_count() {
                return Err(AnalysisError::AtomCountMismatch {
                    frame: 0,
                    expected: topology.atom_count(),
                    found: positions.len(),
                });
            }
            centres.push(sphere_centre(positions, &indices));
        }
        centres.extend(
            trajectory
                .frames
                .iter()
                .map(|frame| sphere_centre(&frame.positions, &indices)),
        );
        Ok(Self { radius, centres })
    }

    /// Writes one `MODEL` per centre, each holding a single pseudo-atom.
    pub fn write_pdb(&self, writer: &mut impl Write) -> io::Result<()> {
        PdbFile::write_remark(
            writer,
            &format!("RADIUS = {:.3} ANGSTROMS", nm_to_angstrom(self.radius)),
        )?;
        for (model, centre) in self.centres.iter().enumerate() {
            writeln!(writer, "MODEL     {:>4}", model + 1)?;
            PdbFile::write_atom_record(
                writer,
                &PdbAtomRecord {
                    hetero: true,
                    serial: 1,
                    name: "CTR",
                    residue_name: "SPH",
                    chain_id: 'A',
                    residue_number: 1,
                    position: *centre,
                    occupancy: 1.0,
                    temp_factor: 0.0,
                    element: "",
                },
            )?;
            writeln!(writer, "ENDMDL")?;
        }
        writeln!(writer, "END")
    }
}
