use crate::error::{CliError, Result};
use gcmcflow::core::models::selection::AtomSelector;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileAtomSelector {
    pub name: String,
    #[serde(rename = "residue-name")]
    pub residue_name: String,
    #[serde(rename = "residue-number")]
    pub residue_number: isize,
}

impl From<FileAtomSelector> for AtomSelector {
    fn from(f: FileAtomSelector) -> Self {
        AtomSelector::new(&f.name, &f.residue_name, f.residue_number)
    }
}

impl From<AtomSelector> for FileAtomSelector {
    fn from(s: AtomSelector) -> Self {
        Self {
            name: s.name,
            residue_name: s.residue_name,
            residue_number: s.residue_number,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileInputsConfig {
    pub topology: Option<PathBuf>,
    pub restart: Option<PathBuf>,
    pub ghosts: Option<PathBuf>,
    pub forcefields: Option<Vec<PathBuf>>,
}

/// `[system]`; distances in Ångström.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileSystemConfig {
    #[serde(rename = "nonbonded-method")]
    pub nonbonded_method: Option<String>,
    pub cutoff: Option<f64>,
    /// Zero or a negative value disables switching.
    #[serde(rename = "switch-distance")]
    pub switch_distance: Option<f64>,
    pub constraints: Option<String>,
    #[serde(rename = "rigid-water")]
    pub rigid_water: Option<bool>,
}

/// `[integrator]`; kelvin, 1/ps and ps.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileIntegratorConfig {
    pub temperature: Option<f64>,
    pub friction: Option<f64>,
    pub timestep: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FilePlatformConfig {
    pub name: Option<String>,
    pub precision: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileSamplerOutputs {
    #[serde(rename = "ghost-file")]
    pub ghost_file: Option<PathBuf>,
    #[serde(rename = "log-file")]
    pub log_file: Option<PathBuf>,
    #[serde(rename = "trajectory-file")]
    pub trajectory_file: Option<PathBuf>,
    #[serde(rename = "restart-file")]
    pub restart_file: Option<PathBuf>,
}

/// `[gcmc]`; the sphere radius is in Ångström.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileGcmcConfig {
    #[serde(rename = "reference-atoms")]
    pub reference_atoms: Option<Vec<FileAtomSelector>>,
    #[serde(rename = "sphere-radius")]
    pub sphere_radius: Option<f64>,
    pub overwrite: Option<bool>,
    pub outputs: Option<FileSamplerOutputs>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileRunConfig {
    pub cycles: Option<u64>,
    #[serde(rename = "md-steps")]
    pub md_steps: Option<u64>,
    pub moves: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileStateReportConfig {
    pub interval: Option<u64>,
    pub output: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FilePostprocessOutputs {
    pub shifted: Option<PathBuf>,
    pub recentred: Option<PathBuf>,
    pub aligned: Option<PathBuf>,
    pub sphere: Option<PathBuf>,
    pub clusters: Option<PathBuf>,
}

/// `[postprocess]`; the cluster cutoff is in Ångström.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FilePostprocessConfig {
    pub trajectory: Option<PathBuf>,
    pub ghosts: Option<PathBuf>,
    #[serde(rename = "recentre-on")]
    pub recentre_on: Option<FileAtomSelector>,
    #[serde(rename = "cluster-cutoff")]
    pub cluster_cutoff: Option<f64>,
    #[serde(rename = "initial-frame")]
    pub initial_frame: Option<bool>,
    pub outputs: Option<FilePostprocessOutputs>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub inputs: Option<FileInputsConfig>,
    pub system: Option<FileSystemConfig>,
    pub integrator: Option<FileIntegratorConfig>,
    pub platform: Option<FilePlatformConfig>,
    pub gcmc: Option<FileGcmcConfig>,
    pub run: Option<FileRunConfig>,
    #[serde(rename = "state-report")]
    pub state_report: Option<FileStateReportConfig>,
    pub postprocess: Option<FilePostprocessConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_every_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            r#"
            [inputs]
            topology = "bpti-ghosts.pdb"
            forcefields = ["amber14-all.toml", "amber14-tip3p.toml"]

            [system]
            nonbonded-method = "pme"
            cutoff = 12.0
            switch-distance = 10.0
            constraints = "hbonds"

            [integrator]
            temperature = 300.0

            [platform]
            name = "Reference"
            precision = "double"

            [gcmc]
            sphere-radius = 4.2
            reference-atoms = [
                { name = "CA", residue-name = "TYR", residue-number = 10 },
                { name = "CA", residue-name = "ASN", residue-number = 43 },
            ]

            [gcmc.outputs]
            ghost-file = "ghosts.txt"

            [run]
            cycles = 5
            md-steps = 10

            [state-report]
            interval = 0

            [postprocess]
            recentre-on = { name = "CA", residue-name = "TYR", residue-number = 10 }
            cluster-cutoff = 2.4
            initial-frame = false

            [postprocess.outputs]
            clusters = "sites.pdb"
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let inputs = config.inputs.unwrap();
        assert_eq!(inputs.topology, Some(PathBuf::from("bpti-ghosts.pdb")));
        assert_eq!(inputs.forcefields.unwrap().len(), 2);
        assert!(inputs.restart.is_none());

        let gcmc = config.gcmc.unwrap();
        let references: Vec<AtomSelector> = gcmc
            .reference_atoms
            .unwrap()
            .into_iter()
            .map(Into::into)
            .collect();
        assert_eq!(references[1], AtomSelector::new("CA", "ASN", 43));
        assert_eq!(
            gcmc.outputs.unwrap().ghost_file,
            Some(PathBuf::from("ghosts.txt"))
        );

        assert_eq!(config.run.unwrap().md_steps, Some(10));
        assert_eq!(config.state_report.unwrap().interval, Some(0));
        let post = config.postprocess.unwrap();
        assert_eq!(post.initial_frame, Some(false));
        assert_eq!(
            post.outputs.unwrap().clusters,
            Some(PathBuf::from("sites.pdb"))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "[run]\ncycels = 5\n").unwrap();

        let result = FileConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = FileConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
