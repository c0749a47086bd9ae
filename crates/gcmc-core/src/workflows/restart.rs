use crate::core::forcefield::builder::create_system;
use crate::core::forcefield::params::ForceField;
use crate::core::forcefield::system::System;
use crate::core::io::ghosts::{GhostHistory, GhostSet, validate_ghosts};
use crate::core::io::pdb::PdbFile;
use crate::core::io::rst7::Rst7File;
use crate::core::models::state::RestartState;
use crate::core::models::topology::Topology;
use crate::engine::config::{InputFiles, RestartConfig, RunConfig};
use crate::engine::context::SimulationContext;
use crate::engine::error::EngineError;
use crate::engine::platform::PlatformRegistry;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reporters::StateDataReporter;
use crate::engine::sampler::{GcmcSampler, GcmcSphere, SamplerAdapter, SamplerSetup};
use crate::engine::simulation::Simulation;
use nalgebra::Point3;
use tracing::{debug, info, instrument, warn};

/// Inputs of a restarted run, loaded and cross-checked.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub topology: Topology,
    /// Coordinates stored in the topology file (nm).
    pub topology_positions: Vec<Point3<f64>>,
    pub restart: RestartState,
    pub ghost_history: GhostHistory,
    /// Last recorded ghost set; seeds the sampler.
    pub initial_ghosts: GhostSet,
}

/// Loads the topology, restart state and ghost history of a previous run.
///
/// The restart must hold one position per topology atom and the last ghost frame must
/// only name water residues of the topology.
pub fn load_inputs(inputs: &InputFiles) -> Result<LoadedInputs, EngineError> {
    let (topology, topology_positions) = PdbFile::read_structure(&inputs.topology)?;
    info!(
        path = %inputs.topology.display(),
        atoms = topology.atom_count(),
        residues = topology.residue_count(),
        "Loaded topology"
    );

    let restart = Rst7File::read_from_path(&inputs.restart)?;
    if restart.particle_count() != topology.atom_count() {
        return Err(EngineError::ParticleCountMismatch {
            what: "Restart file",
            expected: topology.atom_count(),
            found: restart.particle_count(),
        });
    }
    if restart.velocities.is_none() {
        warn!("Restart file has no velocities; the run starts from rest.");
    }

    let ghost_history = GhostHistory::read_from_path(&inputs.ghosts)?;
    let initial_ghosts = ghost_history.last()?.clone();
    validate_ghosts(&initial_ghosts, &topology)?;
    info!(
        frames = ghost_history.len(),
        ghosts = initial_ghosts.len(),
        "Loaded ghost history"
    );

    Ok(LoadedInputs {
        topology,
        topology_positions,
        restart,
        ghost_history,
        initial_ghosts,
    })
}

/// Parameterises `topology` with the configured force-field files.
pub fn build_system(topology: &Topology, config: &RestartConfig) -> Result<System, EngineError> {
    let forcefield = ForceField::load(&config.inputs.forcefields)?;
    let system = create_system(topology, &forcefield, &config.system)?;
    info!(
        particles = system.particle_count(),
        constraints = system.constraint_count(),
        method = %system.nonbonded.method,
        "Built system"
    );
    Ok(system)
}

/// Binds `system` to the configured platform and attaches the state-data reporter.
pub fn create_simulation(
    system: System,
    config: &RestartConfig,
    registry: &PlatformRegistry,
) -> Result<Simulation, EngineError> {
    let platform = registry.get(&config.platform.name)?;
    let context = SimulationContext::new(
        system,
        config.integrator,
        platform,
        config.platform.precision,
    )?;
    let mut simulation = Simulation::new(context);

    let interval = config.state_report.interval;
    if interval > 0 {
        match &config.state_report.output {
            Some(path) => {
                simulation.add_reporter(Box::new(StateDataReporter::create(
                    path,
                    interval,
                    config.gcmc.overwrite,
                )?));
            }
            None => {
                simulation.add_reporter(Box::new(StateDataReporter::stdout(interval)));
            }
        }
    }
    Ok(simulation)
}

/// Runs exactly `run.cycles` iterations of MD steps, GCMC moves and a sampler report.
///
/// The first failure aborts the loop.
pub fn run_cycles(
    simulation: &mut Simulation,
    sampler: &mut SamplerAdapter,
    run: &RunConfig,
    reporter: &ProgressReporter,
) -> Result<u64, EngineError> {
    reporter.report(Progress::TaskStart {
        total_steps: run.cycles,
    });
    for cycle in 1..=run.cycles {
        simulation.step(run.md_steps)?;
        sampler.attempt_moves(&mut simulation.context, run.moves)?;
        sampler.report(simulation)?;

        debug!(cycle, step = simulation.current_step(), "Cycle complete");
        reporter.report(Progress::StatusUpdate {
            text: format!("cycle {}/{}", cycle, run.cycles),
        });
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(run.cycles)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestartResult {
    pub cycles: u64,
    pub final_step: u64,
    /// Simulated time at the end of the run, in ps.
    pub final_time: f64,
    pub moves_attempted: u64,
    pub sampler_reports: u64,
}

/// Restarts a GCMC/MD run from the files of a previous one.
///
/// # Arguments
///
/// * `config` - Run configuration.
/// * `registry` - Platforms the configured platform name is looked up in.
/// * `make_sampler` - Constructs the GCMC sampler for the loaded topology and system.
/// * `reporter` - Progress sink.
///
/// # Errors
///
/// Any loading, construction, backend or sampler failure aborts the run. With
/// `overwrite` disabled, existing sampler output files are an error before anything is
/// computed.
#[instrument(skip_all, name = "restart_workflow")]
pub fn run<F>(
    config: &RestartConfig,
    registry: &PlatformRegistry,
    make_sampler: F,
    reporter: &ProgressReporter,
) -> Result<RestartResult, EngineError>
where
    F: FnOnce(&SamplerSetup, &Topology, &System) -> Result<Box<dyn GcmcSampler>, EngineError>,
{
    // === Phase 0: Inputs and system ===
    let (inputs, system, sphere) = reporter.phase("Loading inputs", || {
        info!("Loading restart inputs and building the system.");
        if !config.gcmc.overwrite {
            let existing = config
                .gcmc
                .outputs
                .paths()
                .into_iter()
                .chain(config.state_report.output.as_ref())
                .find(|p| p.exists());
            if let Some(existing) = existing {
                return Err(EngineError::OutputExists(existing.clone()));
            }
        }
        let inputs = load_inputs(&config.inputs)?;
        let system = build_system(&inputs.topology, config)?;
        let sphere =
            GcmcSphere::resolve(&inputs.topology, &config.gcmc.references, config.gcmc.radius)?;
        Ok::<_, EngineError>((inputs, system, sphere))
    })?;

    // === Phase 1: Context and sampler ===
    let (mut simulation, mut sampler) = reporter.phase("Preparing simulation", || {
        let setup = SamplerSetup {
            sphere,
            temperature: config.integrator.temperature,
            outputs: config.gcmc.outputs.clone(),
            overwrite: config.gcmc.overwrite,
        };
        let sampler = make_sampler(&setup, &inputs.topology, &system)?;

        let mut simulation = create_simulation(system, config, registry)?;
        simulation.context.apply_restart(&inputs.restart)?;

        let mut sampler = SamplerAdapter::new(sampler);
        sampler.initialise(&mut simulation.context, &inputs.initial_ghosts)?;
        Ok::<_, EngineError>((simulation, sampler))
    })?;

    // === Phase 2: Production ===
    let cycles = reporter.phase("GCMC/MD cycles", || {
        info!(
            cycles = config.run.cycles,
            md_steps = config.run.md_steps,
            moves = config.run.moves,
            "Production (continued)"
        );
        run_cycles(&mut simulation, &mut sampler, &config.run, reporter)
    })?;

    let state = simulation.context.state();
    info!(
        step = state.step,
        time_ps = state.time,
        moves = sampler.moves_attempted(),
        "Restarted run complete"
    );
    Ok(RestartResult {
        cycles,
        final_step: state.step,
        final_time: state.time,
        moves_attempted: sampler.moves_attempted(),
        sampler_reports: sampler.reports(),
    })
}

/// Summary of a configuration that passed every pre-run check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub atoms: usize,
    pub residues: usize,
    pub waters: usize,
    pub particles: usize,
    pub constraints: usize,
    pub degrees_of_freedom: usize,
    pub total_charge: f64,
    pub history_frames: usize,
    pub initial_ghosts: usize,
    pub restart_time: Option<f64>,
    pub restart_has_velocities: bool,
    /// Sphere centre at the restart coordinates, in nm.
    pub sphere_centre: Point3<f64>,
    pub sphere_radius: f64,
}

/// Loads every input, builds the system and resolves the GCMC sphere without creating a
/// simulation context.
#[instrument(skip_all, name = "check_workflow")]
pub fn check(config: &RestartConfig, reporter: &ProgressReporter) -> Result<CheckReport, EngineError> {
    reporter.phase("Checking inputs", || {
        let inputs = load_inputs(&config.inputs)?;
        let system = build_system(&inputs.topology, config)?;
        let sphere =
            GcmcSphere::resolve(&inputs.topology, &config.gcmc.references, config.gcmc.radius)?;

        Ok::<_, EngineError>(CheckReport {
            atoms: inputs.topology.atom_count(),
            residues: inputs.topology.residue_count(),
            waters: inputs.topology.water_residue_indices().len(),
            particles: system.particle_count(),
            constraints: system.constraint_count(),
            degrees_of_freedom: system.degrees_of_freedom(),
            total_charge: system.total_charge(),
            history_frames: inputs.ghost_history.len(),
            initial_ghosts: inputs.initial_ghosts.len(),
            restart_time: inputs.restart.time,
            restart_has_velocities: inputs.restart.velocities.is_some(),
            sphere_centre: sphere.centre(&inputs.restart.positions),
            sphere_radius: sphere.radius,
        })
    })
}
