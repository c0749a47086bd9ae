use super::defaults::DefaultsConfig;
use super::file::{
    FileConfig, FileIntegratorConfig, FilePostprocessOutputs, FileSamplerOutputs,
    FileSystemConfig,
};
use super::models::AppConfig;
use crate::cli::{ConfigArgs, PostprocessArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use gcmcflow::core::forcefield::builder::SystemOptions;
use gcmcflow::core::models::selection::AtomSelector;
use gcmcflow::core::units::angstrom_to_nm;
use gcmcflow::engine::config as core_config;
use gcmcflow::engine::integrator::LangevinBaoab;
use gcmcflow::engine::platform::Precision;
use gcmcflow::engine::sampler::SamplerOutputs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Merges built-in defaults, the config file and `--set` values.
pub fn build_config(args: &ConfigArgs) -> Result<AppConfig> {
    build(args, None)
}

/// Like [`build_config`], with the `postprocess` flags taking precedence over everything.
pub fn build_postprocess_config(args: &PostprocessArgs) -> Result<AppConfig> {
    build(&args.config, Some(args))
}

fn build(args: &ConfigArgs, postprocess_args: Option<&PostprocessArgs>) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let inputs_file = file_config.inputs.take().unwrap_or_default();
    let system = merge_system(file_config.system.take(), &defaults)?;
    let integrator = merge_integrator(file_config.integrator.take(), &defaults)?;

    let platform_file = file_config.platform.take().unwrap_or_default();
    let precision = match platform_file.precision {
        Some(name) => Precision::from_str(&name).map_err(CliError::Config)?,
        None => defaults.precision,
    };

    let gcmc_file = file_config.gcmc.take().unwrap_or_default();
    let references: Vec<AtomSelector> = gcmc_file
        .reference_atoms
        .map(|atoms| atoms.into_iter().map(Into::into).collect())
        .unwrap_or_else(|| defaults.reference_atoms.clone());
    let sphere_radius = angstrom_to_nm(positive(
        "gcmc.sphere-radius",
        gcmc_file.sphere_radius.unwrap_or(defaults.sphere_radius),
    )?);
    let sampler_outputs = merge_sampler_outputs(gcmc_file.outputs, &defaults);

    let run_file = file_config.run.take().unwrap_or_default();
    let run = core_config::RunConfig {
        cycles: run_file.cycles.unwrap_or(defaults.cycles),
        md_steps: run_file.md_steps.unwrap_or(defaults.md_steps),
        moves: run_file.moves.unwrap_or(defaults.moves),
    };

    let state_file = file_config.state_report.take().unwrap_or_default();
    let mut restart_builder = core_config::RestartConfigBuilder::new()
        .topology(
            inputs_file
                .topology
                .unwrap_or_else(|| defaults.topology.clone()),
        )
        .restart(
            inputs_file
                .restart
                .unwrap_or_else(|| defaults.restart.clone()),
        )
        .ghosts(
            inputs_file
                .ghosts
                .unwrap_or_else(|| defaults.ghosts.clone()),
        )
        .forcefields(
            inputs_file
                .forcefields
                .unwrap_or_else(|| defaults.forcefields.clone()),
        )
        .system(system)
        .integrator(integrator)
        .platform(platform_file.name.as_deref().unwrap_or(&defaults.platform))
        .precision(precision)
        .reference_atoms(references.clone())
        .sphere_radius(sphere_radius)
        .sampler_outputs(sampler_outputs.clone())
        .overwrite(gcmc_file.overwrite.unwrap_or(defaults.overwrite))
        .run(run)
        .state_report_interval(
            state_file
                .interval
                .unwrap_or(defaults.state_report_interval),
        );
    if let Some(output) = state_file.output {
        restart_builder = restart_builder.state_report_output(output);
    }
    let restart = restart_builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let post_file = file_config.postprocess.take().unwrap_or_default();
    let trajectory = postprocess_args
        .and_then(|a| a.trajectory.clone())
        .or(post_file.trajectory)
        .unwrap_or_else(|| sampler_outputs.trajectory_file.clone());
    let ghosts = postprocess_args
        .and_then(|a| a.ghosts.clone())
        .or(post_file.ghosts)
        .unwrap_or_else(|| sampler_outputs.ghost_file.clone());
    let initial_frame = if postprocess_args.is_some_and(|a| a.no_initial_frame) {
        false
    } else {
        post_file.initial_frame.unwrap_or(defaults.initial_frame)
    };
    let cluster_cutoff = angstrom_to_nm(positive(
        "postprocess.cluster-cutoff",
        post_file.cluster_cutoff.unwrap_or(defaults.cluster_cutoff),
    )?);

    let postprocess = core_config::PostProcessConfigBuilder::new()
        .topology(restart.inputs.topology.clone())
        .trajectory(trajectory)
        .ghosts(ghosts)
        .recentre_on(
            post_file
                .recentre_on
                .map(Into::into)
                .unwrap_or_else(|| defaults.recentre_on.clone()),
        )
        .reference_atoms(references)
        .sphere_radius(sphere_radius)
        .cluster_cutoff(cluster_cutoff)
        .write_initial_sphere_frame(initial_frame)
        .outputs(merge_postprocess_outputs(post_file.outputs, &defaults))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    debug!(?restart, ?postprocess, "Merged configuration");
    Ok(AppConfig {
        restart,
        postprocess,
    })
}

fn positive(key: &str, value: f64) -> Result<f64> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(CliError::Config(format!(
            "`{}` must be positive (got {})",
            key, value
        )))
    }
}

fn merge_system(
    file_val: Option<FileSystemConfig>,
    defaults: &DefaultsConfig,
) -> Result<SystemOptions> {
    let file_val = file_val.unwrap_or_default();
    let nonbonded_method = match file_val.nonbonded_method {
        Some(name) => name.parse().map_err(CliError::Config)?,
        None => defaults.nonbonded_method,
    };
    let constraints = match file_val.constraints {
        Some(name) => name.parse().map_err(CliError::Config)?,
        None => defaults.constraints,
    };
    let switch_distance = file_val
        .switch_distance
        .unwrap_or(defaults.switch_distance);
    Ok(SystemOptions {
        nonbonded_method,
        cutoff: angstrom_to_nm(positive(
            "system.cutoff",
            file_val.cutoff.unwrap_or(defaults.cutoff),
        )?),
        switch_distance: (switch_distance > 0.0).then(|| angstrom_to_nm(switch_distance)),
        constraints,
        rigid_water: file_val.rigid_water.unwrap_or(defaults.rigid_water),
    })
}

fn merge_integrator(
    file_val: Option<FileIntegratorConfig>,
    defaults: &DefaultsConfig,
) -> Result<LangevinBaoab> {
    let file_val = file_val.unwrap_or_default();
    LangevinBaoab::new(
        file_val.temperature.unwrap_or(defaults.temperature),
        file_val.friction.unwrap_or(defaults.friction),
        file_val.timestep.unwrap_or(defaults.timestep),
    )
    .map_err(|e| CliError::Config(e.to_string()))
}

fn merge_sampler_outputs(
    file_val: Option<FileSamplerOutputs>,
    defaults: &DefaultsConfig,
) -> SamplerOutputs {
    let file_val = file_val.unwrap_or_default();
    SamplerOutputs {
        ghost_file: file_val
            .ghost_file
            .unwrap_or_else(|| defaults.ghost_output.clone()),
        log_file: file_val
            .log_file
            .unwrap_or_else(|| defaults.log_output.clone()),
        trajectory_file: file_val
            .trajectory_file
            .unwrap_or_else(|| defaults.trajectory_output.clone()),
        restart_file: file_val
            .restart_file
            .unwrap_or_else(|| defaults.restart_output.clone()),
    }
}

fn merge_postprocess_outputs(
    file_val: Option<FilePostprocessOutputs>,
    defaults: &DefaultsConfig,
) -> core_config::PostProcessOutputs {
    let file_val = file_val.unwrap_or_default();
    core_config::PostProcessOutputs {
        shifted: file_val
            .shifted
            .unwrap_or_else(|| defaults.shifted_output.clone()),
        recentred: file_val
            .recentred
            .unwrap_or_else(|| defaults.recentred_output.clone()),
        aligned: file_val
            .aligned
            .unwrap_or_else(|| defaults.aligned_output.clone()),
        sphere: file_val
            .sphere
            .unwrap_or_else(|| defaults.sphere_output.clone()),
        clusters: file_val
            .clusters
            .unwrap_or_else(|| defaults.clusters_output.clone()),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value) =
            parser::split_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        match key {
            "inputs.topology" => {
                config.inputs.get_or_insert_with(Default::default).topology =
                    Some(PathBuf::from(value));
            }
            "inputs.restart" => {
                config.inputs.get_or_insert_with(Default::default).restart =
                    Some(PathBuf::from(value));
            }
            "inputs.ghosts" => {
                config.inputs.get_or_insert_with(Default::default).ghosts =
                    Some(PathBuf::from(value));
            }
            "inputs.forcefields" => {
                config.inputs.get_or_insert_with(Default::default).forcefields = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(PathBuf::from)
                        .collect(),
                );
            }
            "system.nonbonded-method" => {
                config
                    .system
                    .get_or_insert_with(Default::default)
                    .nonbonded_method = Some(value.to_string());
            }
            "system.cutoff" => {
                config.system.get_or_insert_with(Default::default).cutoff =
                    Some(parse_value(key, value)?);
            }
            "system.switch-distance" => {
                config
                    .system
                    .get_or_insert_with(Default::default)
                    .switch_distance = Some(parse_value(key, value)?);
            }
            "system.constraints" => {
                config.system.get_or_insert_with(Default::default).constraints =
                    Some(value.to_string());
            }
            "system.rigid-water" => {
                config.system.get_or_insert_with(Default::default).rigid_water =
                    Some(parse_value(key, value)?);
            }
            "integrator.temperature" => {
                config
                    .integrator
                    .get_or_insert_with(Default::default)
                    .temperature = Some(parse_value(key, value)?);
            }
            "integrator.friction" => {
                config.integrator.get_or_insert_with(Default::default).friction =
                    Some(parse_value(key, value)?);
            }
            "integrator.timestep" => {
                config.integrator.get_or_insert_with(Default::default).timestep =
                    Some(parse_value(key, value)?);
            }
            "platform.name" => {
                config.platform.get_or_insert_with(Default::default).name =
                    Some(value.to_string());
            }
            "platform.precision" => {
                config.platform.get_or_insert_with(Default::default).precision =
                    Some(value.to_string());
            }
            "gcmc.reference-atoms" => {
                let selectors = parser::parse_atom_selectors(value)
                    .map_err(|e| CliError::Argument(e.to_string()))?;
                config
                    .gcmc
                    .get_or_insert_with(Default::default)
                    .reference_atoms =
                    Some(selectors.into_iter().map(Into::into).collect());
            }
            "gcmc.sphere-radius" => {
                config.gcmc.get_or_insert_with(Default::default).sphere_radius =
                    Some(parse_value(key, value)?);
            }
            "gcmc.overwrite" => {
                config.gcmc.get_or_insert_with(Default::default).overwrite =
                    Some(parse_value(key, value)?);
            }
            "run.cycles" => {
                config.run.get_or_insert_with(Default::default).cycles =
                    Some(parse_value(key, value)?);
            }
            "run.md-steps" => {
                config.run.get_or_insert_with(Default::default).md_steps =
                    Some(parse_value(key, value)?);
            }
            "run.moves" => {
                config.run.get_or_insert_with(Default::default).moves =
                    Some(parse_value(key, value)?);
            }
            "state-report.interval" => {
                config
                    .state_report
                    .get_or_insert_with(Default::default)
                    .interval = Some(parse_value(key, value)?);
            }
            "state-report.output" => {
                config.state_report.get_or_insert_with(Default::default).output =
                    Some(PathBuf::from(value));
            }
            "postprocess.recentre-on" => {
                let selector = parser::parse_atom_selector(value)
                    .map_err(|e| CliError::Argument(e.to_string()))?;
                config
                    .postprocess
                    .get_or_insert_with(Default::default)
                    .recentre_on = Some(selector.into());
            }
            "postprocess.cluster-cutoff" => {
                config
                    .postprocess
                    .get_or_insert_with(Default::default)
                    .cluster_cutoff = Some(parse_value(key, value)?);
            }
            "postprocess.initial-frame" => {
                config
                    .postprocess
                    .get_or_insert_with(Default::default)
                    .initial_frame = Some(parse_value(key, value)?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcmcflow::core::forcefield::system::{ConstraintPolicy, NonbondedMethod};
    use std::fs;
    use tempfile::tempdir;

    fn args_with(config: Option<PathBuf>, set_values: &[&str]) -> ConfigArgs {
        ConfigArgs {
            config,
            set_values: set_values.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn defaults_reproduce_the_bpti_restart() {
        let app = build_config(&ConfigArgs::default()).expect("build ok");
        let restart = app.restart;

        assert_eq!(restart.inputs.topology, PathBuf::from("bpti-ghosts.pdb"));
        assert_eq!(restart.inputs.restart, PathBuf::from("bpti-rst.rst7"));
        assert_eq!(restart.inputs.ghosts, PathBuf::from("gcmc-ghost-wats.txt"));
        assert_eq!(restart.system.nonbonded_method, NonbondedMethod::Pme);
        assert_close(restart.system.cutoff, 1.2);
        assert_close(restart.system.switch_distance.unwrap(), 1.0);
        assert_eq!(restart.system.constraints, ConstraintPolicy::HBonds);
        assert_eq!(restart.integrator, LangevinBaoab::default());
        assert_eq!(restart.platform.name, "CUDA");
        assert_eq!(restart.platform.precision, Precision::Mixed);
        assert_eq!(
            restart.gcmc.references,
            vec![
                AtomSelector::new("CA", "TYR", 10),
                AtomSelector::new("CA", "ASN", 43)
            ]
        );
        assert_close(restart.gcmc.radius, 0.42);
        assert!(!restart.gcmc.overwrite);
        assert_eq!(
            restart.gcmc.outputs.ghost_file,
            PathBuf::from("gcmc-ghost-wats2.txt")
        );
        assert_eq!(restart.run, core_config::RunConfig::default());
        assert_eq!(restart.state_report.interval, 1000);
        assert!(restart.state_report.output.is_none());

        let post = app.postprocess;
        assert_eq!(post.trajectory, restart.gcmc.outputs.trajectory_file);
        assert_eq!(post.ghosts, restart.gcmc.outputs.ghost_file);
        assert_eq!(post.recentre_on, AtomSelector::new("CA", "TYR", 10));
        assert_close(post.cluster_cutoff, 0.24);
        assert!(post.write_initial_sphere_frame);
        assert_eq!(post.outputs.clusters, PathBuf::from("bpti-clusts.pdb"));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            r#"
            [system]
            nonbonded-method = "cutoff-periodic"
            cutoff = 9.0
            switch-distance = 0.0
            constraints = "all-bonds"

            [platform]
            name = "Reference"
            precision = "double"

            [gcmc]
            sphere-radius = 5.0
            reference-atoms = [{ name = "CB", residue-name = "ALA", residue-number = 20 }]

            [gcmc.outputs]
            trajectory-file = "raw.pdb"

            [run]
            cycles = 7

            [postprocess]
            cluster-cutoff = 3.0
            "#,
        )
        .unwrap();

        let app = build_config(&args_with(Some(path), &[])).expect("build ok");
        let restart = app.restart;
        assert_eq!(restart.system.nonbonded_method, NonbondedMethod::CutoffPeriodic);
        assert_close(restart.system.cutoff, 0.9);
        assert!(restart.system.switch_distance.is_none());
        assert_eq!(restart.system.constraints, ConstraintPolicy::AllBonds);
        assert_eq!(restart.platform.name, "Reference");
        assert_eq!(restart.platform.precision, Precision::Double);
        assert_close(restart.gcmc.radius, 0.5);
        assert_eq!(restart.run.cycles, 7);
        assert_eq!(restart.run.md_steps, 1000);

        let post = app.postprocess;
        assert_eq!(post.references, vec![AtomSelector::new("CB", "ALA", 20)]);
        assert_eq!(post.trajectory, PathBuf::from("raw.pdb"));
        assert_close(post.sphere_radius, 0.5);
        assert_close(post.cluster_cutoff, 0.3);
    }

    #[test]
    fn set_values_override_file_and_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "[run]\ncycles = 7\nmoves = 50\n").unwrap();

        let args = args_with(
            Some(path),
            &[
                "run.cycles=20",
                "integrator.temperature=310",
                "gcmc.reference-atoms=CA:TYR10,CA:ALA20",
                "postprocess.recentre-on=CA:ASN43",
                "postprocess.initial-frame=false",
                "state-report.output=state.csv",
                "inputs.forcefields=a.toml, b.toml",
            ],
        );
        let app = build_config(&args).expect("build ok");

        assert_eq!(app.restart.run.cycles, 20);
        assert_eq!(app.restart.run.moves, 50);
        assert_close(app.restart.integrator.temperature, 310.0);
        assert_eq!(
            app.restart.gcmc.references,
            vec![
                AtomSelector::new("CA", "TYR", 10),
                AtomSelector::new("CA", "ALA", 20)
            ]
        );
        assert_eq!(
            app.restart.state_report.output,
            Some(PathBuf::from("state.csv"))
        );
        assert_eq!(
            app.restart.inputs.forcefields,
            vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")]
        );
        assert_eq!(
            app.postprocess.recentre_on,
            AtomSelector::new("CA", "ASN", 43)
        );
        assert!(!app.postprocess.write_initial_sphere_frame);
    }

    #[test]
    fn postprocess_flags_take_precedence() {
        let args = PostprocessArgs {
            config: args_with(None, &["postprocess.initial-frame=true"]),
            trajectory: Some(PathBuf::from("other.pdb")),
            ghosts: Some(PathBuf::from("other-ghosts.txt")),
            no_initial_frame: true,
        };
        let app = build_postprocess_config(&args).expect("build ok");
        assert_eq!(app.postprocess.trajectory, PathBuf::from("other.pdb"));
        assert_eq!(app.postprocess.ghosts, PathBuf::from("other-ghosts.txt"));
        assert!(!app.postprocess.write_initial_sphere_frame);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for set in [
            "run.cycles=many",
            "platform.precision=quad",
            "system.constraints=some",
            "gcmc.sphere-radius=-1",
            "integrator.timestep=0",
            "unknown.key=1",
            "run.cycles",
        ] {
            let result = build_config(&args_with(None, &[set]));
            assert!(
                matches!(result, Err(CliError::Config(_))),
                "{set} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_selectors_are_argument_errors() {
        let result = build_config(&args_with(None, &["postprocess.recentre-on=TYR10"]));
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
