use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use super::integrator::IntegratorError;
use super::platform::{BackendError, Precision};
use super::sampler::SamplerError;
use crate::core::analysis::AnalysisError;
use crate::core::forcefield::builder::SystemBuildError;
use crate::core::forcefield::params::ForceFieldError;
use crate::core::io::ghosts::GhostFileError;
use crate::core::io::pdb::PdbError;
use crate::core::io::rst7::Rst7Error;
use crate::core::io::trajectory::TrajectoryError;
use crate::core::models::selection::SelectionError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read topology: {0}")]
    Topology(#[from] PdbError),

    #[error("Failed to read restart file: {0}")]
    Restart(#[from] Rst7Error),

    #[error("Ghost history error: {0}")]
    Ghosts(#[from] GhostFileError),

    #[error("Force field error: {0}")]
    ForceField(#[from] ForceFieldError),

    #[error("System construction failed: {0}")]
    SystemBuild(#[from] SystemBuildError),

    #[error("Atom selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("Trajectory analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Trajectory I/O failed: {0}")]
    Trajectory(#[from] TrajectoryError),

    #[error("Compute backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("GCMC sampler error: {0}")]
    Sampler(#[from] SamplerError),

    #[error("Invalid integrator: {0}")]
    Integrator(#[from] IntegratorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write state data: {0}")]
    StateData(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform '{name}' is not available (available: {})", available.join(", "))]
    PlatformUnavailable {
        name: String,
        available: Vec<String>,
    },

    #[error("Platform '{platform}' does not support {precision} precision")]
    PrecisionUnsupported {
        platform: String,
        precision: Precision,
    },

    #[error("{what} has {found} particles but the system has {expected}")]
    ParticleCountMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Output file '{}' already exists and overwriting is disabled", .0.display())]
    OutputExists(PathBuf),
}
