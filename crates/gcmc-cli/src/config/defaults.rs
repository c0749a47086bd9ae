use gcmcflow::core::forcefield::system::{ConstraintPolicy, NonbondedMethod};
use gcmcflow::core::models::selection::AtomSelector;
use gcmcflow::engine::platform::Precision;
use std::path::PathBuf;

/// Values used for anything neither the config file nor `--set` provides.
///
/// Distances are in Ångström, matching the config file.
pub struct DefaultsConfig {
    pub topology: PathBuf,
    pub restart: PathBuf,
    pub ghosts: PathBuf,
    pub forcefields: Vec<PathBuf>,
    pub nonbonded_method: NonbondedMethod,
    pub cutoff: f64,
    pub switch_distance: f64,
    pub constraints: ConstraintPolicy,
    pub rigid_water: bool,
    pub temperature: f64,
    pub friction: f64,
    pub timestep: f64,
    pub platform: String,
    pub precision: Precision,
    pub reference_atoms: Vec<AtomSelector>,
    pub sphere_radius: f64,
    pub ghost_output: PathBuf,
    pub log_output: PathBuf,
    pub trajectory_output: PathBuf,
    pub restart_output: PathBuf,
    pub overwrite: bool,
    pub cycles: u64,
    pub md_steps: u64,
    pub moves: u64,
    pub state_report_interval: u64,
    pub recentre_on: AtomSelector,
    pub cluster_cutoff: f64,
    pub initial_frame: bool,
    pub shifted_output: PathBuf,
    pub recentred_output: PathBuf,
    pub aligned_output: PathBuf,
    pub sphere_output: PathBuf,
    pub clusters_output: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            topology: PathBuf::from("bpti-ghosts.pdb"),
            restart: PathBuf::from("bpti-rst.rst7"),
            ghosts: PathBuf::from("gcmc-ghost-wats.txt"),
            forcefields: vec![
                PathBuf::from("amber14-all.toml"),
                PathBuf::from("amber14-tip3p.toml"),
            ],
            nonbonded_method: NonbondedMethod::Pme,
            cutoff: 12.0,
            switch_distance: 10.0,
            constraints: ConstraintPolicy::HBonds,
            rigid_water: true,
            temperature: 298.0,
            friction: 1.0,
            timestep: 0.002,
            platform: "CUDA".to_string(),
            precision: Precision::Mixed,
            reference_atoms: vec![
                AtomSelector::new("CA", "TYR", 10),
                AtomSelector::new("CA", "ASN", 43),
            ],
            sphere_radius: 4.2,
            ghost_output: PathBuf::from("gcmc-ghost-wats2.txt"),
            log_output: PathBuf::from("bpti-gcmc2.log"),
            trajectory_output: PathBuf::from("bpti-raw2.pdb"),
            restart_output: PathBuf::from("bpti-rst2.rst7"),
            overwrite: false,
            cycles: 100,
            md_steps: 1000,
            moves: 100,
            state_report_interval: 1000,
            recentre_on: AtomSelector::new("CA", "TYR", 10),
            cluster_cutoff: 2.4,
            initial_frame: true,
            shifted_output: PathBuf::from("bpti-shifted2.pdb"),
            recentred_output: PathBuf::from("bpti-recentred2.pdb"),
            aligned_output: PathBuf::from("bpti-gcmc2.pdb"),
            sphere_output: PathBuf::from("gcmc_sphere2.pdb"),
            clusters_output: PathBuf::from("bpti-clusts.pdb"),
        }
    }
}
