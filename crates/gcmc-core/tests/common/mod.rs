#![allow(dead_code)]

use gcmcflow::core::forcefield::system::System;
use gcmcflow::core::io::ghosts::{GhostHistoryWriter, GhostSet};
use gcmcflow::core::io::pdb::PdbFile;
use gcmcflow::core::io::rst7::Rst7File;
use gcmcflow::core::models::atom::Element;
use gcmcflow::core::models::cell::PeriodicBox;
use gcmcflow::core::models::selection::AtomSelector;
use gcmcflow::core::models::state::RestartState;
use gcmcflow::core::models::topology::{Topology, TopologyBuilder};
use gcmcflow::core::models::trajectory::{Frame, Trajectory};
use gcmcflow::engine::config::{RestartConfig, RestartConfigBuilder, RunConfig};
use gcmcflow::engine::context::{ContextState, SimulationContext};
use gcmcflow::engine::error::EngineError;
use gcmcflow::engine::integrator::LangevinBaoab;
use gcmcflow::engine::platform::{BackendError, ComputeKernel, Platform, PlatformRegistry, Precision};
use gcmcflow::engine::sampler::{GcmcSampler, SamplerError, SamplerOutputs, SamplerSetup};
use gcmcflow::engine::simulation::Simulation;
use nalgebra::{Point3, Vector3};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const FORCEFIELD: &str = r#"
[atom-types.CT]
mass = 12.01
sigma = 0.339967
epsilon = 0.457730

[atom-types.HC]
mass = 1.008
sigma = 0.264953
epsilon = 0.065689

[atom-types.OW]
mass = 15.9994
sigma = 0.315061
epsilon = 0.636386

[atom-types.HW]
mass = 1.008
sigma = 1.0
epsilon = 0.0

[residues.TYR]
atoms = [
    { name = "CA", type = "CT", charge = 0.1 },
    { name = "HA", type = "HC", charge = -0.1 },
]
bonds = [{ atoms = ["CA", "HA"], length = 0.109 }]

[residues.ALA]
atoms = [
    { name = "CA", type = "CT", charge = 0.05 },
    { name = "HA", type = "HC", charge = -0.05 },
]
bonds = [{ atoms = ["CA", "HA"], length = 0.109 }]

[residues.ASN]
atoms = [
    { name = "CA", type = "CT", charge = 0.2 },
    { name = "HA", type = "HC", charge = -0.2 },
]
bonds = [{ atoms = ["CA", "HA"], length = 0.109 }]

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

pub const BOX_NM: f64 = 3.0;

/// Three protein residues (two atoms each) followed by three waters.
pub fn topology() -> Topology {
    let mut builder = TopologyBuilder::new();
    let mut serial = 0;
    builder.start_chain('A');
    for (number, name) in [(10, "TYR"), (20, "ALA"), (43, "ASN")] {
        builder.start_residue(number, name).unwrap();
        serial += 1;
        builder.add_atom("CA", serial, Element::C).unwrap();
        serial += 1;
        builder.add_atom("HA", serial, Element::H).unwrap();
    }
    builder.start_chain('W');
    for number in 1..=3 {
        builder.start_residue(number, "HOH").unwrap();
        for (name, element) in [("O", Element::O), ("H1", Element::H), ("H2", Element::H)] {
            serial += 1;
            builder.add_atom(name, serial, element).unwrap();
        }
    }
    builder.set_periodic_box(PeriodicBox::orthorhombic(BOX_NM, BOX_NM, BOX_NM));
    builder.build()
}

pub fn positions() -> Vec<Point3<f64>> {
    let protein = [
        Point3::new(1.20, 1.50, 1.50),
        Point3::new(1.20, 1.60, 1.50),
        Point3::new(1.50, 1.40, 1.70),
        Point3::new(1.50, 1.40, 1.80),
        Point3::new(1.80, 1.50, 1.50),
        Point3::new(1.80, 1.60, 1.50),
    ];
    let water_origins = [
        Point3::new(1.50, 1.30, 1.50),
        Point3::new(1.55, 1.70, 1.45),
        Point3::new(0.40, 0.40, 0.40),
    ];
    let mut positions = protein.to_vec();
    for origin in water_origins {
        positions.push(origin);
        positions.push(origin + Vector3::new(0.09572, 0.0, 0.0));
        positions.push(origin + Vector3::new(-0.024, 0.0927, 0.0));
    }
    positions
}

pub fn reference_atoms() -> Vec<AtomSelector> {
    vec![
        AtomSelector::new("CA", "TYR", 10),
        AtomSelector::new("CA", "ASN", 43),
    ]
}

/// Paths of a complete set of restart inputs written into a directory.
pub struct Fixture {
    pub dir: PathBuf,
    pub topology: PathBuf,
    pub restart: PathBuf,
    pub ghosts: PathBuf,
    pub forcefield: PathBuf,
}

impl Fixture {
    pub fn write(dir: &Path, ghost_lines: &str) -> Self {
        let topology_path = dir.join("bpti-ghosts.pdb");
        let trajectory = Trajectory::new(vec![Frame::new(
            positions(),
            Some(PeriodicBox::orthorhombic(BOX_NM, BOX_NM, BOX_NM)),
        )]);
        PdbFile::write_trajectory_to_path(&topology_path, &topology(), &trajectory, &[]).unwrap();

        let restart_path = dir.join("bpti-rst.rst7");
        let velocities = (0..positions().len())
            .map(|i| Vector3::new(0.1 * (i as f64 % 3.0), -0.2, 0.05))
            .collect();
        let restart = RestartState::new(positions())
            .with_velocities(velocities)
            .with_box(PeriodicBox::orthorhombic(BOX_NM, BOX_NM, BOX_NM))
            .with_time(200.0)
            .with_title("restart fixture");
        Rst7File::write_to_path(&restart, &restart_path).unwrap();

        let ghosts_path = dir.join("gcmc-ghost-wats.txt");
        fs::write(&ghosts_path, ghost_lines).unwrap();

        let forcefield_path = dir.join("forcefield.toml");
        fs::write(&forcefield_path, FORCEFIELD).unwrap();

        Self {
            dir: dir.to_path_buf(),
            topology: topology_path,
            restart: restart_path,
            ghosts: ghosts_path,
            forcefield: forcefield_path,
        }
    }

    pub fn sampler_outputs(&self) -> SamplerOutputs {
        SamplerOutputs {
            ghost_file: self.dir.join("gcmc-ghost-wats2.txt"),
            log_file: self.dir.join("bpti-gcmc2.log"),
            trajectory_file: self.dir.join("bpti-raw2.pdb"),
            restart_file: self.dir.join("bpti-rst2.rst7"),
        }
    }

    pub fn restart_config(&self, run: RunConfig) -> RestartConfig {
        RestartConfigBuilder::new()
            .topology(self.topology.clone())
            .restart(self.restart.clone())
            .ghosts(self.ghosts.clone())
            .forcefield(self.forcefield.clone())
            .platform("Recording")
            .precision(Precision::Mixed)
            .reference_atoms(reference_atoms())
            .sphere_radius(0.42)
            .sampler_outputs(self.sampler_outputs())
            .run(run)
            .state_report_output(self.dir.join("state.csv"))
            .build()
            .unwrap()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateKernel(Precision),
    Step(u64),
    Initialise(GhostSet),
    Moves(u64),
    Report,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Moves every atom by a fixed displacement per step.
pub struct DriftKernel {
    log: CallLog,
}

impl ComputeKernel for DriftKernel {
    fn step(&mut self, _: &System, state: &mut ContextState, steps: u64) -> Result<(), BackendError> {
        self.log.borrow_mut().push(Call::Step(steps));
        let shift = Vector3::new(1.0e-5, 0.0, 0.0) * steps as f64;
        for position in state.positions.iter_mut() {
            *position += shift;
        }
        Ok(())
    }

    fn potential_energy(&mut self, system: &System, _: &ContextState) -> Result<f64, BackendError> {
        Ok(-10.0 * system.particle_count() as f64)
    }
}

pub struct RecordingPlatform {
    pub log: CallLog,
}

impl Platform for RecordingPlatform {
    fn name(&self) -> &str {
        "Recording"
    }

    fn supports(&self, _: Precision) -> bool {
        true
    }

    fn create_kernel(
        &self,
        _: &System,
        _: &LangevinBaoab,
        precision: Precision,
    ) -> Result<Box<dyn ComputeKernel>, BackendError> {
        self.log.borrow_mut().push(Call::CreateKernel(precision));
        Ok(Box::new(DriftKernel {
            log: Rc::clone(&self.log),
        }))
    }
}

pub fn registry(log: &CallLog) -> PlatformRegistry {
    let mut registry = PlatformRegistry::new();
    registry.register(Box::new(RecordingPlatform {
        log: Rc::clone(log),
    }));
    registry
}

/// Sampler double that swaps which water is a ghost on every move batch and writes the
/// same outputs a real sampler would.
pub struct FileSampler {
    log: CallLog,
    topology: Topology,
    outputs: SamplerOutputs,
    overwrite: bool,
    ghosts: GhostSet,
    ghost_writer: Option<GhostHistoryWriter<BufWriter<fs::File>>>,
    frames: Trajectory,
}

impl FileSampler {
    pub fn new(log: &CallLog, setup: &SamplerSetup, topology: &Topology) -> Self {
        Self {
            log: Rc::clone(log),
            topology: topology.clone(),
            outputs: setup.outputs.clone(),
            overwrite: setup.overwrite,
            ghosts: GhostSet::new(),
            ghost_writer: None,
            frames: Trajectory::default(),
        }
    }

    fn backend(error: impl std::fmt::Display) -> SamplerError {
        SamplerError::Backend(error.to_string())
    }
}

impl GcmcSampler for FileSampler {
    fn initialise(&mut self, _: &mut SimulationContext, ghosts: &GhostSet) -> Result<(), SamplerError> {
        self.log.borrow_mut().push(Call::Initialise(ghosts.clone()));
        self.ghosts = ghosts.clone();
        self.ghost_writer = Some(
            GhostHistoryWriter::create(&self.outputs.ghost_file, self.overwrite)
                .map_err(Self::backend)?,
        );
        Ok(())
    }

    fn attempt_moves(&mut self, _: &mut SimulationContext, moves: u64) -> Result<(), SamplerError> {
        self.log.borrow_mut().push(Call::Moves(moves));
        self.ghosts = if self.ghosts.contains(&5) {
            GhostSet::from([4])
        } else {
            GhostSet::from([5])
        };
        Ok(())
    }

    fn report(&mut self, simulation: &mut Simulation) -> Result<(), SamplerError> {
        self.log.borrow_mut().push(Call::Report);
        let state = simulation.context.state();

        if let Some(writer) = self.ghost_writer.as_mut() {
            writer.write_frame(&self.ghosts).map_err(Self::backend)?;
        }

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outputs.log_file)
            .map_err(Self::backend)?;
        writeln!(log, "step {} ghosts {}", state.step, self.ghosts.len()).map_err(Self::backend)?;

        self.frames
            .frames
            .push(Frame::new(state.positions.clone(), state.periodic_box));
        PdbFile::write_trajectory_to_path(
            &self.outputs.trajectory_file,
            &self.topology,
            &self.frames,
            &[],
        )
        .map_err(Self::backend)?;

        Rst7File::write_to_path(
            &simulation.context.to_restart("gcmc restart"),
            &self.outputs.restart_file,
        )
        .map_err(Self::backend)?;
        Ok(())
    }
}

pub fn file_sampler(
    log: &CallLog,
) -> impl FnOnce(&SamplerSetup, &Topology, &System) -> Result<Box<dyn GcmcSampler>, EngineError> + '_
{
    move |setup, topology, _| Ok(Box::new(FileSampler::new(log, setup, topology)) as Box<dyn GcmcSampler>)
}
