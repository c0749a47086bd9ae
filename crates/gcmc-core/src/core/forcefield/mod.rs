//! # Force Field Module
//!
//! Turns a [`Topology`](crate::core::models::topology::Topology) into the particle
//! parameters and constraints an engine needs.
//!
//! ## Overview
//!
//! Force fields are described by TOML files holding atom types (mass, Lennard-Jones
//! `sigma`/`epsilon`) and residue templates (atom names, types, partial charges, bonds with
//! their equilibrium lengths). Several files may be combined, e.g. a protein force field
//! plus a water model. Only parameter *assignment* lives here; evaluating energies and
//! forces is the job of the compute backend.
//!
//! ## Key Components
//!
//! - [`params`] - Atom types, residue templates and loading/merging of parameter files
//! - [`system`] - The parameterised [`system::System`] handed to backends
//! - [`builder`] - [`builder::create_system`], matching residues to templates

pub mod builder;
pub mod params;
pub mod system;
