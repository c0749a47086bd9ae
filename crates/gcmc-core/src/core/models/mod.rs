//! # Core Models Module
//!
//! Data structures describing what is being simulated and what was recorded.
//!
//! ## Key Components
//!
//! - [`atom`] - Atoms and chemical elements
//! - [`residue`] - Residues and their classification (protein, water, ion)
//! - [`chain`] - Chains as ordered residue lists
//! - [`topology`] - The immutable atom/residue/chain hierarchy with its periodic cell
//! - [`cell`] - Triclinic periodic box vectors and imaging helpers
//! - [`state`] - Restart states (positions, velocities, box) loaded from checkpoints
//! - [`trajectory`] - Ordered frames recorded over one topology
//! - [`selection`] - Picking single atoms by name, residue name and number
//! - [`ids`] - Stable identifiers for atoms, residues, and chains
//!
//! ## Indexing
//!
//! Besides their stable ids, atoms and residues carry a 0-based `index` giving their
//! position in file order. Coordinate arrays, constraint pairs and ghost-water lists are
//! all expressed in these indices.

pub mod atom;
pub mod cell;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod selection;
pub mod state;
pub mod topology;
pub mod trajectory;
