use crate::core::analysis::align::align_to_first_frame;
use crate::core::analysis::cluster::{cluster_waters, write_clusters_pdb};
use crate::core::analysis::recentre::recentre;
use crate::core::analysis::shift::shift_ghost_waters;
use crate::core::analysis::sphere::SphereTrajectory;
use crate::core::io::ghosts::GhostHistory;
use crate::core::io::pdb::PdbFile;
use crate::core::io::trajectory::format_for_path;
use crate::core::models::topology::Topology;
use crate::core::models::trajectory::Trajectory;
use crate::core::units::nm_to_angstrom;
use crate::engine::config::{PostProcessConfig, PostProcessOutputs};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessResult {
    pub outputs: PostProcessOutputs,
    pub frames: usize,
    /// Largest CA RMSD to the first frame after alignment, in nm.
    pub max_alignment_rmsd: f64,
    pub sphere_models: usize,
    pub clusters: usize,
}

fn read_trajectory(path: &Path, topology: &Topology) -> Result<Trajectory, EngineError> {
    Ok(format_for_path(path)?.read(path, topology)?)
}

fn write_trajectory(
    path: &Path,
    topology: &Topology,
    trajectory: &Trajectory,
    remark: String,
) -> Result<(), EngineError> {
    format_for_path(path)?.write(path, topology, trajectory, &[remark])?;
    info!(path = %path.display(), frames = trajectory.len(), "Wrote trajectory");
    Ok(())
}

/// Prepares a recorded GCMC/MD trajectory for visualisation.
///
/// Five stages run in order, and each one reads the artifact the previous one wrote:
/// ghost waters are moved out of the cell, the trajectory is recentred on a reference
/// atom, frames are superimposed on the first, the GCMC sphere is written as its own
/// trajectory and the water sites inside the sphere are clustered.
#[instrument(skip_all, name = "postprocess_workflow")]
pub fn run(
    config: &PostProcessConfig,
    reporter: &ProgressReporter,
) -> Result<PostProcessResult, EngineError> {
    let outputs = &config.outputs;
    let (topology, topology_positions) = PdbFile::read_structure(&config.topology)?;
    let ghosts = GhostHistory::read_from_path(&config.ghosts)?;

    // === Stage 1: Move ghost waters out of the cell ===
    let frames = reporter.phase("Shifting ghost waters", || {
        let mut trajectory = read_trajectory(&config.trajectory, &topology)?;
        shift_ghost_waters(&topology, &mut trajectory, &ghosts)?;
        write_trajectory(
            &outputs.shifted,
            &topology,
            &trajectory,
            "GHOST WATERS SHIFTED OUT OF THE PERIODIC CELL".to_string(),
        )?;
        Ok::<_, EngineError>(trajectory.len())
    })?;

    // === Stage 2: Recentre ===
    reporter.phase("Recentring", || {
        let mut trajectory = read_trajectory(&outputs.shifted, &topology)?;
        recentre(&topology, &mut trajectory, &config.recentre_on, Some(&ghosts))?;
        write_trajectory(
            &outputs.recentred,
            &topology,
            &trajectory,
            format!("RECENTRED ON {}", config.recentre_on),
        )
    })?;

    // === Stage 3: Align ===
    let max_alignment_rmsd = reporter.phase("Aligning", || {
        let mut trajectory = read_trajectory(&outputs.recentred, &topology)?;
        let deviations = align_to_first_frame(&topology, &mut trajectory)?;
        write_trajectory(
            &outputs.aligned,
            &topology,
            &trajectory,
            "ALIGNED ON PROTEIN CA ATOMS TO FRAME 1".to_string(),
        )?;
        Ok::<_, EngineError>(deviations.into_iter().fold(0.0, f64::max))
    })?;

    // === Stage 4: Sphere trajectory ===
    let sphere_models = reporter.phase("Writing GCMC sphere", || {
        let trajectory = read_trajectory(&outputs.aligned, &topology)?;
        let initial = config
            .write_initial_sphere_frame
            .then_some(topology_positions.as_slice());
        let sphere = SphereTrajectory::from_trajectory(
            &topology,
            &trajectory,
            &config.references,
            config.sphere_radius,
            initial,
        )?;
        let mut writer = BufWriter::new(File::create(&outputs.sphere)?);
        sphere.write_pdb(&mut writer)?;
        writer.flush()?;
        info!(path = %outputs.sphere.display(), models = sphere.centres.len(), "Wrote sphere trajectory");
        Ok::<_, EngineError>(sphere.centres.len())
    })?;

    // === Stage 5: Cluster water sites ===
    let clusters = reporter.phase("Clustering waters", || {
        let trajectory = read_trajectory(&outputs.aligned, &topology)?;
        let sphere = SphereTrajectory::from_trajectory(
            &topology,
            &trajectory,
            &config.references,
            config.sphere_radius,
            None,
        )?;
        let clusters = cluster_waters(
            &topology,
            &trajectory,
            &sphere.centres,
            config.sphere_radius,
            config.cluster_cutoff,
        )?;
        let mut writer = BufWriter::new(File::create(&outputs.clusters)?);
        write_clusters_pdb(&mut writer, &clusters, config.cluster_cutoff)?;
        writer.flush()?;
        info!(
            path = %outputs.clusters.display(),
            clusters = clusters.len(),
            cutoff_angstrom = nm_to_angstrom(config.cluster_cutoff),
            "Wrote water clusters"
        );
        Ok::<_, EngineError>(clusters.len())
    })?;

    Ok(PostProcessResult {
        outputs: outputs.clone(),
        frames,
        max_alignment_rmsd,
        sphere_models,
        clusters,
    })
}
