//! # Workflows Module
//!
//! End-to-end procedures built on [`crate::core`] and [`crate::engine`].
//!
//! - **Restart Workflow** ([`restart`]) - Loads a previous run's topology, restart file
//!   and ghost history, builds the system, binds it to a compute platform, seeds the GCMC
//!   sampler and runs the fixed MD/GCMC cycle loop. [`restart::check`] performs the same
//!   loading and validation without a compute platform.
//! - **Post-Processing Workflow** ([`postprocess`]) - Turns the raw trajectory into
//!   visualisation artifacts: shifted, recentred and aligned trajectories, the GCMC
//!   sphere trajectory and clustered water sites.
//!
//! Both report phase and task progress through
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter) and return
//! [`EngineError`](crate::engine::error::EngineError) on the first failure.

pub mod postprocess;
pub mod restart;
