use super::context::SimulationContext;
use super::simulation::Simulation;
use crate::core::analysis::sphere::{resolve_reference_atoms, sphere_centre};
use crate::core::analysis::AnalysisError;
use crate::core::io::ghosts::GhostSet;
use crate::core::models::selection::AtomSelector;
use crate::core::models::topology::Topology;
use nalgebra::Point3;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplerError {
    #[error("Sampler used before initialise() was called")]
    NotInitialised,
    #[error("Sampler was already initialised")]
    AlreadyInitialised,
    #[error("{0}")]
    Backend(String),
}

/// A grand-canonical Monte Carlo sampler operating on a simulation context.
///
/// Insertion and deletion proposals, acceptance and ghost bookkeeping all live behind
/// this trait. Callers go through [`SamplerAdapter`], which guarantees the call order.
pub trait GcmcSampler {
    /// Binds the sampler to `context` and switches off the residues in `ghosts`.
    fn initialise(
        &mut self,
        context: &mut SimulationContext,
        ghosts: &GhostSet,
    ) -> Result<(), SamplerError>;

    /// Attempts `moves` insertion/deletion proposals.
    fn attempt_moves(
        &mut self,
        context: &mut SimulationContext,
        moves: u64,
    ) -> Result<(), SamplerError>;

    /// Records the current state (log, frame, ghost set, restart).
    fn report(&mut self, simulation: &mut Simulation) -> Result<(), SamplerError>;
}

/// Enforces that a sampler is initialised exactly once, before it is used.
pub struct SamplerAdapter {
    sampler: Box<dyn GcmcSampler>,
    initialised: bool,
    moves_attempted: u64,
    reports: u64,
}

impl SamplerAdapter {
    pub fn new(sampler: Box<dyn GcmcSampler>) -> Self {
        Self {
            sampler,
            initialised: false,
            moves_attempted: 0,
            reports: 0,
        }
    }

    pub fn initialise(
        &mut self,
        context: &mut SimulationContext,
        ghosts: &GhostSet,
    ) -> Result<(), SamplerError> {
        if self.initialised {
            return Err(SamplerError::AlreadyInitialised);
        }
        self.sampler.initialise(context, ghosts)?;
        self.initialised = true;
        debug!(ghosts = ghosts.len(), "Initialised GCMC sampler");
        Ok(())
    }

    pub fn attempt_moves(
        &mut self,
        context: &mut SimulationContext,
        moves: u64,
    ) -> Result<(), SamplerError> {
        self.ensure_initialised()?;
        self.sampler.attempt_moves(context, moves)?;
        self.moves_attempted += moves;
        Ok(())
    }

    pub fn report(&mut self, simulation: &mut Simulation) -> Result<(), SamplerError> {
        self.ensure_initialised()?;
        self.sampler.report(simulation)?;
        self.reports += 1;
        Ok(())
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn moves_attempted(&self) -> u64 {
        self.moves_attempted
    }

    pub fn reports(&self) -> u64 {
        self.reports
    }

    fn ensure_initialised(&self) -> Result<(), SamplerError> {
        if self.initialised {
            Ok(())
        } else {
            Err(SamplerError::NotInitialised)
        }
    }
}

/// The spherical region in which insertions and deletions are attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct GcmcSphere {
    pub references: Vec<AtomSelector>,
    /// Resolved atom indices of `references`.
    pub indices: Vec<usize>,
    /// Radius in nm.
    pub radius: f64,
}

impl GcmcSphere {
    pub fn resolve(
        topology: &Topology,
        references: &[AtomSelector],
        radius: f64,
    ) -> Result<Self, AnalysisError> {
        if radius <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "sphere radius must be positive (got {} nm)",
                radius
            )));
        }
        let indices = resolve_reference_atoms(topology, references)?;
        Ok(Self {
            references: references.to_vec(),
            indices,
            radius,
        })
    }

    pub fn centre(&self, positions: &[Point3<f64>]) -> Point3<f64> {
        sphere_centre(positions, &self.indices)
    }

    pub fn contains(&self, positions: &[Point3<f64>], point: &Point3<f64>) -> bool {
        (point - self.centre(positions)).norm() <= self.radius
    }
}

/// Files a sampler writes while the run progresses.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerOutputs {
    pub ghost_file: PathBuf,
    pub log_file: PathBuf,
    pub trajectory_file: PathBuf,
    pub restart_file: PathBuf,
}

impl SamplerOutputs {
    pub fn paths(&self) -> [&PathBuf; 4] {
        [
            &self.ghost_file,
            &self.log_file,
            &self.trajectory_file,
            &self.restart_file,
        ]
    }
}

/// Everything a sampler implementation needs to be constructed for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerSetup {
    pub sphere: GcmcSphere,
    /// Temperature in K.
    pub temperature: f64,
    pub outputs: SamplerOutputs,
    /// Refuse to start when an output file already exists.
    pub overwrite: bool,
}
