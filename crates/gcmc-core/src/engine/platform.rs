use super::context::ContextState;
use super::error::EngineError;
use super::integrator::LangevinBaoab;
use crate::core::forcefield::system::System;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Floating-point precision requested from a compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    Single,
    #[default]
    Mixed,
    Double,
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "mixed" => Ok(Self::Mixed),
            "double" => Ok(Self::Double),
            other => Err(format!(
                "unknown precision '{}' (expected single, mixed or double)",
                other
            )),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "single",
            Self::Mixed => "mixed",
            Self::Double => "double",
        };
        f.write_str(name)
    }
}

/// Failure reported by a compute backend.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{platform}: {message}")]
pub struct BackendError {
    pub platform: String,
    pub message: String,
}

impl BackendError {
    pub fn new(platform: &str, message: impl Into<String>) -> Self {
        Self {
            platform: platform.to_string(),
            message: message.into(),
        }
    }
}

/// Numerical kernel bound to one system and integrator.
///
/// Implementations own all backend resources; the context only hands them the state to
/// advance.
pub trait ComputeKernel {
    /// Advances `state` by `steps` integrator steps.
    ///
    /// Implementations update positions, velocities and (for barostatted runs) the box.
    /// The step counter and simulated time are maintained by the caller.
    fn step(&mut self, system: &System, state: &mut ContextState, steps: u64)
    -> Result<(), BackendError>;

    /// Potential energy of `state` in kJ/mol.
    fn potential_energy(&mut self, system: &System, state: &ContextState)
    -> Result<f64, BackendError>;
}

/// A named factory for compute kernels (e.g. a GPU or reference CPU backend).
pub trait Platform {
    fn name(&self) -> &str;

    fn supports(&self, precision: Precision) -> bool;

    fn create_kernel(
        &self,
        system: &System,
        integrator: &LangevinBaoab,
        precision: Precision,
    ) -> Result<Box<dyn ComputeKernel>, BackendError>;
}

/// Platforms available to a run, looked up by name.
#[derive(Default)]
pub struct PlatformRegistry {
    platforms: BTreeMap<String, Box<dyn Platform>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `platform`, replacing any platform with the same name.
    pub fn register(&mut self, platform: Box<dyn Platform>) -> &mut Self {
        let name = platform.name().to_string();
        debug!(platform = %name, "Registered compute platform");
        self.platforms.insert(name, platform);
        self
    }

    pub fn get(&self, name: &str) -> Result<&dyn Platform, EngineError> {
        self.platforms
            .get(name)
            .map(|platform| platform.as_ref())
            .ok_or_else(|| EngineError::PlatformUnavailable {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.platforms.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}
