use super::params::{ForceField, ResidueTemplate};
use super::system::{
    Constraint, ConstraintPolicy, NonbondedMethod, NonbondedSettings, Particle, System,
};
use crate::core::models::cell::PeriodicBox;
use crate::core::models::residue::Residue;
use crate::core::models::topology::Topology;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum SystemBuildError {
    #[error("No template found for residue {name} {number} (tried: {tried})")]
    UnparameterizedResidue {
        name: String,
        number: isize,
        tried: String,
    },
    #[error("Residue {name} {number} does not match template '{template}': {detail}")]
    TemplateMismatch {
        name: String,
        number: isize,
        template: String,
        detail: String,
    },
    #[error("Template '{template}' uses unknown atom type '{atom_type}'")]
    UnknownAtomType { template: String, atom_type: String },
    #[error("Nonbonded method '{0}' requires periodic box vectors, but the topology has none")]
    MissingPeriodicBox(NonbondedMethod),
    #[error("Switching distance ({switch} nm) must be smaller than the cutoff ({cutoff} nm)")]
    SwitchNotBelowCutoff { switch: f64, cutoff: f64 },
    #[error("Cutoff ({cutoff} nm) exceeds half the shortest box edge ({limit} nm)")]
    CutoffTooLarge { cutoff: f64, limit: f64 },
    #[error("Cutoff must be positive (got {0} nm)")]
    InvalidCutoff(f64),
}

/// Options controlling how a topology is turned into a [`System`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemOptions {
    pub nonbonded_method: NonbondedMethod,
    /// Cutoff in nm.
    pub cutoff: f64,
    /// Switching distance in nm.
    pub switch_distance: Option<f64>,
    pub constraints: ConstraintPolicy,
    /// Constrain every template bond of water residues, whatever `constraints` says.
    pub rigid_water: bool,
}

impl Default for SystemOptions {
    fn default() -> Self {
        Self {
            nonbonded_method: NonbondedMethod::Pme,
            cutoff: 1.2,
            switch_distance: Some(1.0),
            constraints: ConstraintPolicy::HBonds,
            rigid_water: true,
        }
    }
}

/// Builds a parameterised [`System`] from `topology`.
///
/// Every residue is matched to a template by name. Protein residues at the start or
/// end of a chain first try the terminal variants (`N`/`C` prefixed names), as force
/// fields such as Amber define separate termini.
///
/// # Errors
///
/// Fails on the first residue without a template, on any atom-name mismatch between a
/// residue and its template, and on inconsistent cutoff/box settings.
pub fn create_system(
    topology: &Topology,
    forcefield: &ForceField,
    options: &SystemOptions,
) -> Result<System, SystemBuildError> {
    validate_nonbonded(topology, options)?;

    let mut particles: Vec<Option<Particle>> = vec![None; topology.atom_count()];
    let mut constraints = Vec::new();
    let hydrogens: HashSet<usize> = topology
        .atoms()
        .filter(|atom| atom.element.is_hydrogen())
        .map(|atom| atom.index)
        .collect();

    for chain in topology.chains() {
        let protein_positions: Vec<usize> = chain
            .residues()
            .iter()
            .enumerate()
            .filter(|(_, id)| topology.residue(**id).is_some_and(|r| r.is_protein()))
            .map(|(i, _)| i)
            .collect();
        let first_protein = protein_positions.first().copied();
        let last_protein = protein_positions.last().copied();

        for (position, &residue_id) in chain.residues().iter().enumerate() {
            let Some(residue) = topology.residue(residue_id) else {
                continue;
            };
            let terminus = if !residue.is_protein() {
                Terminus::None
            } else if Some(position) == first_protein {
                Terminus::N
            } else if Some(position) == last_protein {
                Terminus::C
            } else {
                Terminus::None
            };
            let (template_name, template) = find_template(forcefield, residue, terminus)?;
            let atom_indices = match_atoms(topology, residue, &template_name, template)?;

            for (template_atom, &atom_index) in template.atoms.iter().zip(&atom_indices) {
                let atom_type = forcefield.atom_type(&template_atom.atom_type).ok_or_else(|| {
                    SystemBuildError::UnknownAtomType {
                        template: template_name.to_string(),
                        atom_type: template_atom.atom_type.clone(),
                    }
                })?;
                particles[atom_index] = Some(Particle {
                    mass: atom_type.mass,
                    charge: template_atom.charge,
                    sigma: atom_type.sigma,
                    epsilon: atom_type.epsilon,
                });
            }

            let rigid = options.rigid_water && residue.is_water();
            for bond in &template.bonds {
                let (Some(a), Some(b)) = (
                    template_index(template, &bond.atoms[0]).map(|i| atom_indices[i]),
                    template_index(template, &bond.atoms[1]).map(|i| atom_indices[i]),
                ) else {
                    return Err(SystemBuildError::TemplateMismatch {
                        name: residue.name.clone(),
                        number: residue.number,
                        template: template_name.to_string(),
                        detail: format!(
                            "bond {}-{} names an atom the template does not define",
                            bond.atoms[0], bond.atoms[1]
                        ),
                    });
                };
                let involves_hydrogen = hydrogens.contains(&a) || hydrogens.contains(&b);
                let constrained = rigid
                    || match options.constraints {
                        ConstraintPolicy::None => false,
                        ConstraintPolicy::HBonds => involves_hydrogen,
                        ConstraintPolicy::AllBonds => true,
                    };
                if constrained {
                    constraints.push(Constraint {
                        atoms: (a.min(b), a.max(b)),
                        distance: bond.length,
                    });
                }
            }
        }
    }

    let particles: Vec<Particle> = particles.into_iter().flatten().collect();
    debug!(
        particles = particles.len(),
        constraints = constraints.len(),
        "Assigned force-field parameters"
    );

    let system = System {
        particles,
        constraints,
        nonbonded: NonbondedSettings {
            method: options.nonbonded_method,
            cutoff: options.cutoff,
            switch_distance: options.switch_distance,
        },
        periodic_box: topology.periodic_box().copied(),
    };
    info!(
        particles = system.particle_count(),
        constraints = system.constraint_count(),
        method = %options.nonbonded_method,
        "System built"
    );
    Ok(system)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminus {
    None,
    N,
    C,
}

fn validate_nonbonded(topology: &Topology, options: &SystemOptions) -> Result<(), SystemBuildError> {
    let method = options.nonbonded_method;
    if !method.uses_cutoff() {
        return Ok(());
    }
    if options.cutoff <= 0.0 {
        return Err(SystemBuildError::InvalidCutoff(options.cutoff));
    }
    if let Some(switch) = options.switch_distance {
        if switch >= options.cutoff {
            return Err(SystemBuildError::SwitchNotBelowCutoff {
                switch,
                cutoff: options.cutoff,
            });
        }
    }
    if method.is_periodic() {
        let cell = topology
            .periodic_box()
            .ok_or(SystemBuildError::MissingPeriodicBox(method))?;
        check_cutoff_fits_box(options.cutoff, cell)?;
    }
    Ok(())
}

/// Fails when `cutoff` (nm) exceeds the minimum-image limit of `cell`.
pub fn check_cutoff_fits_box(cutoff: f64, cell: &PeriodicBox) -> Result<(), SystemBuildError> {
    let limit = cell.max_cutoff();
    if cutoff > limit {
        return Err(SystemBuildError::CutoffTooLarge { cutoff, limit });
    }
    Ok(())
}

fn find_template<'a>(
    forcefield: &'a ForceField,
    residue: &Residue,
    terminus: Terminus,
) -> Result<(String, &'a ResidueTemplate), SystemBuildError> {
    let mut candidates = Vec::with_capacity(2);
    match terminus {
        Terminus::N => candidates.push(format!("N{}", residue.name)),
        Terminus::C => candidates.push(format!("C{}", residue.name)),
        Terminus::None => {}
    }
    candidates.push(residue.name.clone());

    for name in &candidates {
        if let Some(template) = forcefield.template(name) {
            return Ok((name.clone(), template));
        }
    }
    Err(SystemBuildError::UnparameterizedResidue {
        name: residue.name.clone(),
        number: residue.number,
        tried: candidates.join(", "),
    })
}

fn template_index(template: &ResidueTemplate, name: &str) -> Option<usize> {
    template.atoms.iter().position(|atom| atom.name == name)
}

/// Returns, for each template atom in order, the index of the matching topology atom.
fn match_atoms(
    topology: &Topology,
    residue: &Residue,
    template_name: &str,
    template: &ResidueTemplate,
) -> Result<Vec<usize>, SystemBuildError> {
    let mismatch = |detail: String| SystemBuildError::TemplateMismatch {
        name: residue.name.clone(),
        number: residue.number,
        template: template_name.to_string(),
        detail,
    };

    let mut seen = HashSet::new();
    for &atom_id in residue.atoms() {
        let Some(atom) = topology.atom(atom_id) else {
            continue;
        };
        if !seen.insert(atom.name.as_str()) {
            return Err(mismatch(format!("atom {} appears twice", atom.name)));
        }
        if template.atom(&atom.name).is_none() {
            return Err(mismatch(format!("atom {} is not in the template", atom.name)));
        }
    }

    template
        .atoms
        .iter()
        .map(|template_atom| {
            residue
                .get_atom_id_by_name(&template_atom.name)
                .and_then(|id| topology.atom(id))
                .map(|atom| atom.index)
                .ok_or_else(|| mismatch(format!("atom {} is missing", template_atom.name)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;
    use crate::core::models::cell::PeriodicBox;
    use crate::core::models::topology::TopologyBuilder;

    const PARAMS: &str = r#"
        [atom-types.N]
        mass = 14.01
        sigma = 0.325
        epsilon = 0.711
        [atom-types.H]
        mass = 1.008
        sigma = 0.107
        epsilon = 0.066
        [atom-types.CT]
        mass = 12.01
        sigma = 0.340
        epsilon = 0.458
        [atom-types.OW]
        mass = 16.0
        sigma = 0.315
        epsilon = 0.636
        [atom-types.HW]
        mass = 1.008
        sigma = 0.0
        epsilon = 0.0

        [residues.NGLY]
        atoms = [
            { name = "N", type = "N", charge = 0.3 },
            { name = "H", type = "H", charge = 0.2 },
            { name = "CA", type = "CT", charge = 0.1 },
        ]
        bonds = [
            { atoms = ["N", "H"], length = 0.101 },
            { atoms = ["N", "CA"], length = 0.1449 },
        ]

        [residues.GLY]
        atoms = [
            { name = "N", type = "N", charge = -0.4 },
            { name = "H", type = "H", charge = 0.3 },
            { name = "CA", type = "CT", charge = 0.1 },
        ]
        bonds = [
            { atoms = ["N", "H"], length = 0.101 },
            { atoms = ["N", "CA"], length = 0.1449 },
        ]

        [residues.HOH]
        atoms = [
            { name = "O", type = "OW", charge = -0.834 },
            { name = "H1", type = "HW", charge = 0.417 },
            { name = "H2", type = "HW", charge = 0.417 },
        ]
        bonds = [
            { atoms = ["O", "H1"], length = 0.09572 },
            { atoms = ["O", "H2"], length = 0.09572 },
            { atoms = ["H1", "H2"], length = 0.15139 },
        ]
    "#;

    fn forcefield() -> ForceField {
        let mut ff = ForceField::default();
        ff.merge_toml(PARAMS, "test").unwrap();
        ff
    }

    fn add_gly(builder: &mut TopologyBuilder, number: isize, serial: usize) {
        builder.start_residue(number, "GLY").unwrap();
        builder.add_atom("N", serial, Element::N).unwrap();
        builder.add_atom("H", serial + 1, Element::H).unwrap();
        builder.add_atom("CA", serial + 2, Element::C).unwrap();
    }

    fn topology(with_box: bool) -> Topology {
        let mut builder = TopologyBuilder::new();
        builder.start_chain('A');
        add_gly(&mut builder, 1, 1);
        add_gly(&mut builder, 2, 4);
        builder.start_chain('W');
        builder.start_residue(3, "HOH").unwrap();
        builder.add_atom("H1", 7, Element::H).unwrap();
        builder.add_atom("O", 8, Element::O).unwrap();
        builder.add_atom("H2", 9, Element::H).unwrap();
        if with_box {
            builder.set_periodic_box(PeriodicBox::orthorhombic(3.0, 3.0, 3.0));
        }
        builder.build()
    }

    #[test]
    fn builds_particles_in_atom_order_with_terminal_templates() {
        let system = create_system(&topology(true), &forcefield(), &SystemOptions::default()).unwrap();
        assert_eq!(system.particle_count(), 9);
        assert_eq!(system.particles[0].charge, 0.3);
        assert_eq!(system.particles[3].charge, -0.4);
        assert_eq!(system.particles[6].mass, 1.008);
        assert_eq!(system.particles[7].charge, -0.834);
        assert!((system.total_charge() - 0.6).abs() < 1e-9);
        assert!(system.periodic_box.is_some());
    }

    #[test]
    fn hbonds_policy_constrains_hydrogen_bonds_and_rigid_water() {
        let system = create_system(&topology(true), &forcefield(), &SystemOptions::default()).unwrap();
        let pairs: Vec<_> = system.constraints.iter().map(|c| c.atoms).collect();
        assert_eq!(pairs, vec![(0, 1), (3, 4), (6, 7), (7, 8), (6, 8)]);
        assert_eq!(system.constraints[4].distance, 0.15139);
    }

    #[test]
    fn other_policies_change_the_constraint_set() {
        let ff = forcefield();
        let topology = topology(true);
        let none = SystemOptions {
            constraints: ConstraintPolicy::None,
            rigid_water: false,
            ..SystemOptions::default()
        };
        assert!(create_system(&topology, &ff, &none).unwrap().constraints.is_empty());

        let all = SystemOptions {
            constraints: ConstraintPolicy::AllBonds,
            rigid_water: false,
            ..SystemOptions::default()
        };
        assert_eq!(create_system(&topology, &ff, &all).unwrap().constraint_count(), 7);
    }

    #[test]
    fn missing_template_and_atom_mismatch_are_errors() {
        let mut builder = TopologyBuilder::new();
        builder.start_chain('A');
        builder.start_residue(1, "LIG").unwrap();
        builder.add_atom("C1", 1, Element::C).unwrap();
        let options = SystemOptions {
            nonbonded_method: NonbondedMethod::NoCutoff,
            ..SystemOptions::default()
        };
        let err = create_system(&builder.build(), &forcefield(), &options).unwrap_err();
        assert!(matches!(err, SystemBuildError::UnparameterizedResidue { ref name, .. } if name == "LIG"));

        let mut builder = TopologyBuilder::new();
        builder.start_chain('W');
        builder.start_residue(1, "HOH").unwrap();
        builder.add_atom("O", 1, Element::O).unwrap();
        builder.add_atom("H1", 2, Element::H).unwrap();
        let err = create_system(&builder.build(), &forcefield(), &options).unwrap_err();
        assert!(matches!(err, SystemBuildError::TemplateMismatch { ref detail, .. } if detail.contains("H2")));
    }

    #[test]
    fn cutoff_and_box_settings_are_validated() {
        let ff = forcefield();
        let err = create_system(&topology(false), &ff, &SystemOptions::default()).unwrap_err();
        assert_eq!(err, SystemBuildError::MissingPeriodicBox(NonbondedMethod::Pme));

        let too_large = SystemOptions {
            cutoff: 2.0,
            ..SystemOptions::default()
        };
        assert!(matches!(
            create_system(&topology(true), &ff, &too_large),
            Err(SystemBuildError::CutoffTooLarge { .. })
        ));

        let bad_switch = SystemOptions {
            switch_distance: Some(1.2),
            ..SystemOptions::default()
        };
        assert!(matches!(
            create_system(&topology(true), &ff, &bad_switch),
            Err(SystemBuildError::SwitchNotBelowCutoff { .. })
        ));

        let vacuum = SystemOptions {
            nonbonded_method: NonbondedMethod::CutoffNonPeriodic,
            ..SystemOptions::default()
        };
        assert!(create_system(&topology(false), &ff, &vacuum).is_ok());
    }
}
