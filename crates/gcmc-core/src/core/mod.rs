//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Molecular Representation** ([`models`]) - Topology, periodic cells, restart states and trajectories
//! - **File I/O** ([`io`]) - PDB structures and trajectories, Amber restart files, ghost histories
//! - **Parameterization** ([`forcefield`]) - Residue templates and construction of a simulatable `System`
//! - **Trajectory Analysis** ([`analysis`]) - Ghost shifting, recentring, alignment, sphere tracking and water clustering
//! - **Units** ([`units`]) - Physical constants and unit conversions
//!
//! All lengths inside the library are nanometres, times picoseconds, energies kJ/mol and
//! temperatures kelvin. Conversions to Ångström happen only at file boundaries.

pub mod analysis;
pub mod forcefield;
pub mod io;
pub mod models;
pub mod units;
