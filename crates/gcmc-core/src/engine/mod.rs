//! # Simulation Engine Module
//!
//! Mutable run-time machinery that sits between the immutable models in [`crate::core`]
//! and the end-to-end procedures in [`crate::workflows`].
//!
//! ## Key Components
//!
//! - [`context`] - `SimulationContext`: a `System` bound to a compute kernel plus its state
//! - [`simulation`] - Stepping with periodic reporters
//! - [`platform`] - Compute-backend traits and the platform registry
//! - [`sampler`] - GCMC sampler trait, call-order adapter and the GCMC sphere
//! - [`reporters`] - Reporter trait and the CSV state-data reporter
//! - [`config`] - Typed run configuration with builders
//! - [`progress`] - Progress events for front ends
//!
//! Force evaluation, integration and GCMC moves are performed by implementations of
//! [`platform::ComputeKernel`] and [`sampler::GcmcSampler`] supplied by the caller.

pub mod config;
pub mod context;
pub mod error;
pub mod integrator;
pub mod platform;
pub mod progress;
pub mod reporters;
pub mod sampler;
pub mod simulation;
