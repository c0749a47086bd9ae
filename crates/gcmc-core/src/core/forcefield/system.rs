use crate::core::models::cell::PeriodicBox;
use std::fmt;
use std::str::FromStr;

/// How long-range nonbonded interactions are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonbondedMethod {
    NoCutoff,
    CutoffNonPeriodic,
    CutoffPeriodic,
    Ewald,
    Pme,
}

impl NonbondedMethod {
    pub fn is_periodic(&self) -> bool {
        matches!(
            self,
            NonbondedMethod::CutoffPeriodic | NonbondedMethod::Ewald | NonbondedMethod::Pme
        )
    }

    pub fn uses_cutoff(&self) -> bool {
        !matches!(self, NonbondedMethod::NoCutoff)
    }
}

impl FromStr for NonbondedMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "nocutoff" => Ok(NonbondedMethod::NoCutoff),
            "cutoffnonperiodic" => Ok(NonbondedMethod::CutoffNonPeriodic),
            "cutoffperiodic" => Ok(NonbondedMethod::CutoffPeriodic),
            "ewald" => Ok(NonbondedMethod::Ewald),
            "pme" => Ok(NonbondedMethod::Pme),
            _ => Err(format!("Unknown nonbonded method: {}", s)),
        }
    }
}

impl fmt::Display for NonbondedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NonbondedMethod::NoCutoff => "no-cutoff",
            NonbondedMethod::CutoffNonPeriodic => "cutoff-non-periodic",
            NonbondedMethod::CutoffPeriodic => "cutoff-periodic",
            NonbondedMethod::Ewald => "ewald",
            NonbondedMethod::Pme => "pme",
        };
        write!(f, "{}", name)
    }
}

/// Which bonds are replaced by rigid distance constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConstraintPolicy {
    #[default]
    None,
    HBonds,
    AllBonds,
}

impl FromStr for ConstraintPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "none" => Ok(ConstraintPolicy::None),
            "hbonds" => Ok(ConstraintPolicy::HBonds),
            "allbonds" => Ok(ConstraintPolicy::AllBonds),
            _ => Err(format!("Unknown constraint policy: {}", s)),
        }
    }
}

impl fmt::Display for ConstraintPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintPolicy::None => "none",
            ConstraintPolicy::HBonds => "h-bonds",
            ConstraintPolicy::AllBonds => "all-bonds",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Mass in daltons.
    pub mass: f64,
    /// Partial charge in elementary charges.
    pub charge: f64,
    /// Lennard-Jones sigma in nm.
    pub sigma: f64,
    /// Lennard-Jones epsilon in kJ/mol.
    pub epsilon: f64,
}

/// A fixed distance (nm) between two particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub atoms: (usize, usize),
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonbondedSettings {
    pub method: NonbondedMethod,
    /// Cutoff in nm; ignored by [`NonbondedMethod::NoCutoff`].
    pub cutoff: f64,
    /// Distance (nm) at which the switching function starts, if any.
    pub switch_distance: Option<f64>,
}

/// A parameterised system: everything a compute backend needs besides coordinates.
///
/// Particle `i` corresponds to atom `i` of the topology it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    pub particles: Vec<Particle>,
    pub constraints: Vec<Constraint>,
    pub nonbonded: NonbondedSettings,
    /// Default cell, taken from the topology.
    pub periodic_box: Option<PeriodicBox>,
}

impl System {
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn total_charge(&self) -> f64 {
        self.particles.iter().map(|p| p.charge).sum()
    }

    /// Degrees of freedom after removing constraints and centre-of-mass motion.
    pub fn degrees_of_freedom(&self) -> usize {
        let massive = self.particles.iter().filter(|p| p.mass > 0.0).count();
        (3 * massive).saturating_sub(self.constraints.len() + 3)
    }
}
