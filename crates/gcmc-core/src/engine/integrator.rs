use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IntegratorError {
    #[error("Temperature must be positive (got {0} K)")]
    Temperature(f64),
    #[error("Friction coefficient must be non-negative (got {0} 1/ps)")]
    Friction(f64),
    #[error("Timestep must be positive (got {0} ps)")]
    Timestep(f64),
}

/// Langevin dynamics with the BAOAB splitting.
///
/// This is only a description; the compute backend performs the integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LangevinBaoab {
    /// Heat-bath temperature in K.
    pub temperature: f64,
    /// Friction coefficient in 1/ps.
    pub friction: f64,
    /// Timestep in ps.
    pub timestep: f64,
}

impl LangevinBaoab {
    pub fn new(temperature: f64, friction: f64, timestep: f64) -> Result<Self, IntegratorError> {
        let integrator = Self {
            temperature,
            friction,
            timestep,
        };
        integrator.validate()?;
        Ok(integrator)
    }

    pub fn validate(&self) -> Result<(), IntegratorError> {
        if !(self.temperature > 0.0) {
            return Err(IntegratorError::Temperature(self.temperature));
        }
        if !(self.friction >= 0.0) {
            return Err(IntegratorError::Friction(self.friction));
        }
        if !(self.timestep > 0.0) {
            return Err(IntegratorError::Timestep(self.timestep));
        }
        Ok(())
    }
}

impl Default for LangevinBaoab {
    fn default() -> Self {
        Self {
            temperature: 298.0,
            friction: 1.0,
            timestep: 0.002,
        }
    }
}
