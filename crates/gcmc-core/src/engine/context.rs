use super::error::EngineError;
use super::integrator::LangevinBaoab;
use super::platform::{ComputeKernel, Platform, Precision};
use crate::core::forcefield::builder::check_cutoff_fits_box;
use crate::core::forcefield::system::System;
use crate::core::models::cell::PeriodicBox;
use crate::core::models::state::RestartState;
use crate::core::units::BOLTZMANN_KJ_PER_MOL_K;
use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

/// Dynamic state advanced by a compute kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextState {
    /// Positions in nm.
    pub positions: Vec<Point3<f64>>,
    /// Velocities in nm/ps.
    pub velocities: Vec<Vector3<f64>>,
    pub periodic_box: Option<PeriodicBox>,
    /// Simulated time in ps.
    pub time: f64,
    pub step: u64,
}

impl ContextState {
    fn zeroed(particles: usize, periodic_box: Option<PeriodicBox>) -> Self {
        Self {
            positions: vec![Point3::origin(); particles],
            velocities: vec![Vector3::zeros(); particles],
            periodic_box,
            time: 0.0,
            step: 0,
        }
    }
}

/// A `System` bound to an integrator and a compute kernel, together with its state.
pub struct SimulationContext {
    system: System,
    integrator: LangevinBaoab,
    platform: String,
    precision: Precision,
    kernel: Box<dyn ComputeKernel>,
    state: ContextState,
}

impl SimulationContext {
    pub fn new(
        system: System,
        integrator: LangevinBaoab,
        platform: &dyn Platform,
        precision: Precision,
    ) -> Result<Self, EngineError> {
        integrator.validate()?;
        if !platform.supports(precision) {
            return Err(EngineError::PrecisionUnsupported {
                platform: platform.name().to_string(),
                precision,
            });
        }
        let kernel = platform.create_kernel(&system, &integrator, precision)?;
        let state = ContextState::zeroed(system.particle_count(), system.periodic_box);
        info!(
            platform = platform.name(),
            %precision,
            particles = system.particle_count(),
            "Created simulation context"
        );
        Ok(Self {
            system,
            integrator,
            platform: platform.name().to_string(),
            precision,
            kernel,
            state,
        })
    }

    /// Transfers positions, velocities, box and time from a restart file in one go.
    ///
    /// Missing velocities are set to zero and a missing box falls back to the system's
    /// box. Nothing is modified when the particle counts disagree.
    pub fn apply_restart(&mut self, restart: &RestartState) -> Result<(), EngineError> {
        let expected = self.system.particle_count();
        if restart.positions.len() != expected {
            return Err(EngineError::ParticleCountMismatch {
                what: "Restart positions",
                expected,
                found: restart.positions.len(),
            });
        }
        if let Some(velocities) = &restart.velocities {
            if velocities.len() != expected {
                return Err(EngineError::ParticleCountMismatch {
                    what: "Restart velocities",
                    expected,
                    found: velocities.len(),
                });
            }
        }

        let periodic_box = restart.periodic_box.or(self.system.periodic_box);
        if let (true, Some(cell)) = (self.system.nonbonded.method.is_periodic(), &periodic_box) {
            check_cutoff_fits_box(self.system.nonbonded.cutoff, cell)?;
        }

        self.state.positions = restart.positions.clone();
        self.state.velocities = restart
            .velocities
            .clone()
            .unwrap_or_else(|| vec![Vector3::zeros(); expected]);
        self.state.periodic_box = periodic_box;
        self.state.time = restart.time.unwrap_or(0.0);
        debug!(
            velocities = restart.velocities.is_some(),
            restart_box = restart.periodic_box.is_some(),
            time = self.state.time,
            "Applied restart state"
        );
        Ok(())
    }

    /// Advances the dynamics by `steps` integrator steps.
    pub fn step(&mut self, steps: u64) -> Result<(), EngineError> {
        if steps == 0 {
            return Ok(());
        }
        self.kernel.step(&self.system, &mut self.state, steps)?;
        self.state.step += steps;
        self.state.time += steps as f64 * self.integrator.timestep;
        Ok(())
    }

    pub fn potential_energy(&mut self) -> Result<f64, EngineError> {
        Ok(self.kernel.potential_energy(&self.system, &self.state)?)
    }

    /// Kinetic energy in kJ/mol.
    pub fn kinetic_energy(&self) -> f64 {
        self.system
            .particles
            .iter()
            .zip(&self.state.velocities)
            .map(|(particle, v)| 0.5 * particle.mass * v.norm_squared())
            .sum()
    }

    /// Instantaneous temperature in K from the kinetic energy.
    pub fn temperature(&self) -> f64 {
        let dof = self.system.degrees_of_freedom();
        if dof == 0 {
            return 0.0;
        }
        2.0 * self.kinetic_energy() / (dof as f64 * BOLTZMANN_KJ_PER_MOL_K)
    }

    /// Box volume in nm³, if the context is periodic.
    pub fn volume(&self) -> Option<f64> {
        self.state.periodic_box.as_ref().map(PeriodicBox::volume)
    }

    pub fn state(&self) -> &ContextState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ContextState {
        &mut self.state
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn integrator(&self) -> &LangevinBaoab {
        &self.integrator
    }

    pub fn platform_name(&self) -> &str {
        &self.platform
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Snapshot of the current state in restart form.
    pub fn to_restart(&self, title: &str) -> RestartState {
        let mut restart = RestartState::new(self.state.positions.clone())
            .with_velocities(self.state.velocities.clone())
            .with_time(self.state.time)
            .with_title(title);
        if let Some(cell) = self.state.periodic_box {
            restart = restart.with_box(cell);
        }
        restart
    }
}
