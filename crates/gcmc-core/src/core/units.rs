/// Nanometres per Ångström.
pub const NM_PER_ANGSTROM: f64 = 0.1;

/// Ångström per nanometre.
pub const ANGSTROM_PER_NM: f64 = 10.0;

/// Molar Boltzmann constant in kJ/(mol·K).
pub const BOLTZMANN_KJ_PER_MOL_K: f64 = 0.008_314_462_618;

/// Amber restart velocities are stored in Å per (1/20.455) ps.
pub const AMBER_VELOCITY_FACTOR: f64 = 20.455;

#[inline]
pub fn angstrom_to_nm(value: f64) -> f64 {
    value * NM_PER_ANGSTROM
}

#[inline]
pub fn nm_to_angstrom(value: f64) -> f64 {
    value * ANGSTROM_PER_NM
}

/// Converts an Amber restart velocity component into nm/ps.
#[inline]
pub fn amber_velocity_to_nm_per_ps(value: f64) -> f64 {
    value * AMBER_VELOCITY_FACTOR * NM_PER_ANGSTROM
}

/// Converts a velocity component in nm/ps into Amber restart units.
#[inline]
pub fn nm_per_ps_to_amber_velocity(value: f64) -> f64 {
    value * ANGSTROM_PER_NM / AMBER_VELOCITY_FACTOR
}
