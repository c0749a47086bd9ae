use super::integrator::LangevinBaoab;
use super::platform::Precision;
use super::sampler::SamplerOutputs;
use crate::core::forcefield::builder::SystemOptions;
use crate::core::models::selection::AtomSelector;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Files a restarted run is seeded from.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFiles {
    pub topology: PathBuf,
    pub restart: PathBuf,
    pub ghosts: PathBuf,
    pub forcefields: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    pub name: String,
    pub precision: Precision,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GcmcConfig {
    pub references: Vec<AtomSelector>,
    /// Sphere radius in nm.
    pub radius: f64,
    pub outputs: SamplerOutputs,
    pub overwrite: bool,
}

/// Shape of the MD/GCMC loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub cycles: u64,
    pub md_steps: u64,
    pub moves: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cycles: 100,
            md_steps: 1000,
            moves: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateReportConfig {
    /// Steps between rows; zero disables the reporter.
    pub interval: u64,
    /// Destination file; `None` writes to stdout.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestartConfig {
    pub inputs: InputFiles,
    pub system: SystemOptions,
    pub integrator: LangevinBaoab,
    pub platform: PlatformConfig,
    pub gcmc: GcmcConfig,
    pub run: RunConfig,
    pub state_report: StateReportConfig,
}

#[derive(Default)]
pub struct RestartConfigBuilder {
    topology: Option<PathBuf>,
    restart: Option<PathBuf>,
    ghosts: Option<PathBuf>,
    forcefields: Vec<PathBuf>,
    system: Option<SystemOptions>,
    integrator: Option<LangevinBaoab>,
    platform_name: Option<String>,
    precision: Option<Precision>,
    references: Vec<AtomSelector>,
    sphere_radius: Option<f64>,
    sampler_outputs: Option<SamplerOutputs>,
    overwrite: bool,
    run: Option<RunConfig>,
    state_report_interval: Option<u64>,
    state_report_output: Option<PathBuf>,
}

impl RestartConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(mut self, path: PathBuf) -> Self {
        self.topology = Some(path);
        self
    }
    pub fn restart(mut self, path: PathBuf) -> Self {
        self.restart = Some(path);
        self
    }
    pub fn ghosts(mut self, path: PathBuf) -> Self {
        self.ghosts = Some(path);
        self
    }
    pub fn forcefield(mut self, path: PathBuf) -> Self {
        self.forcefields.push(path);
        self
    }
    pub fn forcefields(mut self, paths: Vec<PathBuf>) -> Self {
        self.forcefields = paths;
        self
    }
    pub fn system(mut self, options: SystemOptions) -> Self {
        self.system = Some(options);
        self
    }
    pub fn integrator(mut self, integrator: LangevinBaoab) -> Self {
        self.integrator = Some(integrator);
        self
    }
    pub fn platform(mut self, name: &str) -> Self {
        self.platform_name = Some(name.to_string());
        self
    }
    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }
    pub fn reference_atom(mut self, selector: AtomSelector) -> Self {
        self.references.push(selector);
        self
    }
    pub fn reference_atoms(mut self, selectors: Vec<AtomSelector>) -> Self {
        self.references = selectors;
        self
    }
    pub fn sphere_radius(mut self, radius_nm: f64) -> Self {
        self.sphere_radius = Some(radius_nm);
        self
    }
    pub fn sampler_outputs(mut self, outputs: SamplerOutputs) -> Self {
        self.sampler_outputs = Some(outputs);
        self
    }
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
    pub fn run(mut self, run: RunConfig) -> Self {
        self.run = Some(run);
        self
    }
    pub fn state_report_interval(mut self, steps: u64) -> Self {
        self.state_report_interval = Some(steps);
        self
    }
    pub fn state_report_output(mut self, path: PathBuf) -> Self {
        self.state_report_output = Some(path);
        self
    }

    /// Builds the configuration.
    ///
    /// Input files, at least one force-field file, the platform name, at least one
    /// reference atom, the sphere radius and the sampler outputs are required. Everything
    /// else falls back to its default.
    pub fn build(self) -> Result<RestartConfig, ConfigError> {
        if self.forcefields.is_empty() {
            return Err(ConfigError::MissingParameter("forcefields"));
        }
        if self.references.is_empty() {
            return Err(ConfigError::MissingParameter("reference_atoms"));
        }
        let inputs = InputFiles {
            topology: self
                .topology
                .ok_or(ConfigError::MissingParameter("topology"))?,
            restart: self
                .restart
                .ok_or(ConfigError::MissingParameter("restart"))?,
            ghosts: self.ghosts.ok_or(ConfigError::MissingParameter("ghosts"))?,
            forcefields: self.forcefields,
        };
        let platform = PlatformConfig {
            name: self
                .platform_name
                .ok_or(ConfigError::MissingParameter("platform"))?,
            precision: self.precision.unwrap_or_default(),
        };
        let gcmc = GcmcConfig {
            references: self.references,
            radius: self
                .sphere_radius
                .ok_or(ConfigError::MissingParameter("sphere_radius"))?,
            outputs: self
                .sampler_outputs
                .ok_or(ConfigError::MissingParameter("sampler_outputs"))?,
            overwrite: self.overwrite,
        };
        Ok(RestartConfig {
            inputs,
            system: self.system.unwrap_or_default(),
            integrator: self.integrator.unwrap_or_default(),
            platform,
            gcmc,
            run: self.run.unwrap_or_default(),
            state_report: StateReportConfig {
                interval: self.state_report_interval.unwrap_or(1000),
                output: self.state_report_output,
            },
        })
    }
}

/// Artifact written by each post-processing stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessOutputs {
    pub shifted: PathBuf,
    pub recentred: PathBuf,
    pub aligned: PathBuf,
    pub sphere: PathBuf,
    pub clusters: PathBuf,
}

impl PostProcessOutputs {
    pub fn paths(&self) -> [&PathBuf; 5] {
        [
            &self.shifted,
            &self.recentred,
            &self.aligned,
            &self.sphere,
            &self.clusters,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessConfig {
    pub topology: PathBuf,
    pub trajectory: PathBuf,
    pub ghosts: PathBuf,
    pub recentre_on: AtomSelector,
    pub references: Vec<AtomSelector>,
    /// Sphere radius in nm.
    pub sphere_radius: f64,
    /// Linkage cutoff for water clustering, in nm.
    pub cluster_cutoff: f64,
    pub write_initial_sphere_frame: bool,
    pub outputs: PostProcessOutputs,
}

#[derive(Default)]
pub struct PostProcessConfigBuilder {
    topology: Option<PathBuf>,
    trajectory: Option<PathBuf>,
    ghosts: Option<PathBuf>,
    recentre_on: Option<AtomSelector>,
    references: Vec<AtomSelector>,
    sphere_radius: Option<f64>,
    cluster_cutoff: Option<f64>,
    write_initial_sphere_frame: Option<bool>,
    outputs: Option<PostProcessOutputs>,
}

impl PostProcessConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(mut self, path: PathBuf) -> Self {
        self.topology = Some(path);
        self
    }
    pub fn trajectory(mut self, path: PathBuf) -> Self {
        self.trajectory = Some(path);
        self
    }
    pub fn ghosts(mut self, path: PathBuf) -> Self {
        self.ghosts = Some(path);
        self
    }
    pub fn recentre_on(mut self, selector: AtomSelector) -> Self {
        self.recentre_on = Some(selector);
        self
    }
    pub fn reference_atoms(mut self, selectors: Vec<AtomSelector>) -> Self {
        self.references = selectors;
        self
    }
    pub fn sphere_radius(mut self, radius_nm: f64) -> Self {
        self.sphere_radius = Some(radius_nm);
        self
    }
    pub fn cluster_cutoff(mut self, cutoff_nm: f64) -> Self {
        self.cluster_cutoff = Some(cutoff_nm);
        self
    }
    pub fn write_initial_sphere_frame(mut self, enabled: bool) -> Self {
        self.write_initial_sphere_frame = Some(enabled);
        self
    }
    pub fn outputs(mut self, outputs: PostProcessOutputs) -> Self {
        self.outputs = Some(outputs);
        self
    }

    pub fn build(self) -> Result<PostProcessConfig, ConfigError> {
        if self.references.is_empty() {
            return Err(ConfigError::MissingParameter("reference_atoms"));
        }
        Ok(PostProcessConfig {
            topology: self
                .topology
                .ok_or(ConfigError::MissingParameter("topology"))?,
            trajectory: self
                .trajectory
                .ok_or(ConfigError::MissingParameter("trajectory"))?,
            ghosts: self.ghosts.ok_or(ConfigError::MissingParameter("ghosts"))?,
            recentre_on: self
                .recentre_on
                .ok_or(ConfigError::MissingParameter("recentre_on"))?,
            references: self.references,
            sphere_radius: self
                .sphere_radius
                .ok_or(ConfigError::MissingParameter("sphere_radius"))?,
            cluster_cutoff: self
                .cluster_cutoff
                .ok_or(ConfigError::MissingParameter("cluster_cutoff"))?,
            write_initial_sphere_frame: self.write_initial_sphere_frame.unwrap_or(true),
            outputs: self.outputs.ok_or(ConfigError::MissingParameter("outputs"))?,
        })
    }
}
