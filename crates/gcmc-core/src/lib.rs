//! # gcmcflow Core Library
//!
//! Restart, drive and post-process grand-canonical Monte Carlo / molecular dynamics
//! (GCMC/MD) simulations of solvated proteins.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture. The physics engine and the GCMC
//! sampling engine are not part of this crate: they plug in through the traits in
//! [`engine::platform`] and [`engine::sampler`].
//!
//! - **[`core`]: The Foundation.** Immutable data models (`Topology`, `System`,
//!   `Trajectory`), file I/O for structures, restart files and ghost histories, force-field
//!   templates with the system builder, and the pure trajectory transforms used for
//!   post-processing.
//!
//! - **[`engine`]: The Driver.** The mutable `SimulationContext`, the `Simulation` with its
//!   reporters, the compute-platform registry, the sampler adapter and the typed run
//!   configuration.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures: restarting a GCMC/MD run
//!   from a previous one and post-processing the resulting trajectory.

pub mod core;
pub mod engine;
pub mod workflows;
