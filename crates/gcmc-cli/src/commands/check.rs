use crate::cli::ConfigArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use gcmcflow::core::units::nm_to_angstrom;
use gcmcflow::engine::config::RestartConfig;
use gcmcflow::engine::progress::ProgressReporter;
use gcmcflow::workflows::restart::{self, CheckReport};
use std::fmt::Write;
use tracing::info;

pub fn run(args: ConfigArgs) -> Result<()> {
    info!("Merging configuration from defaults, file and --set values...");
    let app = build_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the check workflow...");
    let report = restart::check(&app.restart, &reporter)?;

    print!("{}", format_report(&report, &app.restart));
    Ok(())
}

fn format_report(report: &CheckReport, config: &RestartConfig) -> String {
    let mut out = String::new();
    let run = &config.run;
    let centre = report.sphere_centre.map(nm_to_angstrom);

    let _ = writeln!(out, "Topology        {}", config.inputs.topology.display());
    let _ = writeln!(
        out,
        "  {} atoms, {} residues, {} waters",
        report.atoms, report.residues, report.waters
    );
    let _ = writeln!(
        out,
        "System          {} particles, {} constraints, {} degrees of freedom, net charge {:.3} e",
        report.particles, report.constraints, report.degrees_of_freedom, report.total_charge
    );
    let restart_time = report
        .restart_time
        .map_or_else(|| "no time".to_string(), |t| format!("t = {:.3} ps", t));
    let velocities = if report.restart_has_velocities {
        "with velocities"
    } else {
        "without velocities"
    };
    let _ = writeln!(
        out,
        "Restart         {} ({}, {})",
        config.inputs.restart.display(),
        restart_time,
        velocities
    );
    let _ = writeln!(
        out,
        "Ghost history   {} frames, {} ghosts in the last frame",
        report.history_frames, report.initial_ghosts
    );
    let _ = writeln!(
        out,
        "GCMC sphere     centre ({:.3}, {:.3}, {:.3}) A, radius {:.3} A",
        centre.x,
        centre.y,
        centre.z,
        nm_to_angstrom(report.sphere_radius)
    );
    let _ = writeln!(
        out,
        "Run             {} cycles of {} MD steps and {} GCMC moves on {} ({})",
        run.cycles, run.md_steps, run.moves, config.platform.name, config.platform.precision
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcmcflow::core::models::selection::AtomSelector;
    use gcmcflow::engine::config::RestartConfigBuilder;
    use gcmcflow::engine::sampler::SamplerOutputs;
    use nalgebra::Point3;
    use std::path::PathBuf;

    fn config() -> RestartConfig {
        RestartConfigBuilder::new()
            .topology(PathBuf::from("bpti-ghosts.pdb"))
            .restart(PathBuf::from("bpti-rst.rst7"))
            .ghosts(PathBuf::from("gcmc-ghost-wats.txt"))
            .forcefield(PathBuf::from("ff.toml"))
            .platform("CUDA")
            .reference_atom(AtomSelector::new("CA", "TYR", 10))
            .sphere_radius(0.42)
            .sampler_outputs(SamplerOutputs {
                ghost_file: PathBuf::from("g.txt"),
                log_file: PathBuf::from("g.log"),
                trajectory_file: PathBuf::from("raw.pdb"),
                restart_file: PathBuf::from("out.rst7"),
            })
            .build()
            .unwrap()
    }

    #[test]
    fn report_lists_inputs_sphere_and_run_shape() {
        let report = CheckReport {
            atoms: 15,
            residues: 6,
            waters: 3,
            particles: 15,
            constraints: 12,
            degrees_of_freedom: 30,
            total_charge: 0.0,
            history_frames: 2,
            initial_ghosts: 1,
            restart_time: Some(200.0),
            restart_has_velocities: true,
            sphere_centre: Point3::new(1.5, 1.0, 0.25),
            sphere_radius: 0.42,
        };

        let text = format_report(&report, &config());
        assert!(text.contains("15 atoms, 6 residues, 3 waters"));
        assert!(text.contains("12 constraints, 30 degrees of freedom"));
        assert!(text.contains("t = 200.000 ps, with velocities"));
        assert!(text.contains("2 frames, 1 ghosts in the last frame"));
        assert!(text.contains("centre (15.000, 10.000, 2.500) A, radius 4.200 A"));
        assert!(text.contains("100 cycles of 1000 MD steps and 100 GCMC moves on CUDA (mixed)"));
    }
}
