mod common;

use common::{Call, CallLog, Fixture, file_sampler, registry};
use gcmcflow::core::io::ghosts::{GhostFileError, GhostHistory, GhostSet};
use gcmcflow::core::io::rst7::Rst7File;
use gcmcflow::engine::config::RunConfig;
use gcmcflow::engine::error::EngineError;
use gcmcflow::engine::platform::Precision;
use gcmcflow::engine::progress::{Progress, ProgressReporter};
use gcmcflow::workflows::restart;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn short_run(cycles: u64) -> RunConfig {
    RunConfig {
        cycles,
        md_steps: 1000,
        moves: 100,
    }
}

#[test]
fn cycles_call_step_move_and_report_in_order() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::write(dir.path(), "3,\n4,\n5,\n");
    let config = fixture.restart_config(short_run(3));
    let log = CallLog::default();

    let result = restart::run(
        &config,
        &registry(&log),
        file_sampler(&log),
        &ProgressReporter::new(),
    )
    .unwrap();

    let mut expected = vec![
        Call::CreateKernel(Precision::Mixed),
        Call::Initialise(GhostSet::from([5])),
    ];
    for _ in 0..3 {
        expected.extend([Call::Step(1000), Call::Moves(100), Call::Report]);
    }
    assert_eq!(*log.borrow(), expected);

    assert_eq!(result.cycles, 3);
    assert_eq!(result.final_step, 3000);
    assert_eq!(result.moves_attempted, 300);
    assert_eq!(result.sampler_reports, 3);
    assert!((result.final_time - 206.0).abs() < 1e-9);
}

#[test]
fn sampler_outputs_and_state_log_are_written() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::write(dir.path(), "5,\n");
    let config = fixture.restart_config(short_run(4));
    let log = CallLog::default();

    restart::run(&config, &registry(&log), file_sampler(&log), &ProgressReporter::new()).unwrap();

    let outputs = fixture.sampler_outputs();
    let history = GhostHistory::read_from_path(&outputs.ghost_file).unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history.last().unwrap(), &GhostSet::from([5]));

    let restart = Rst7File::read_from_path(&outputs.restart_file).unwrap();
    assert_eq!(restart.particle_count(), 15);
    assert!(restart.velocities.is_some());

    let state = fs::read_to_string(dir.path().join("state.csv")).unwrap();
    let lines: Vec<&str> = state.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("Step,Potential Energy (kJ/mole)"));
    assert!(lines[4].starts_with("4000,-150.0000,"));
}

#[test]
fn empty_ghost_history_aborts_before_the_sampler_is_built() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::write(dir.path(), "");
    let config = fixture.restart_config(short_run(1));
    let log = CallLog::default();

    let result = restart::run(&config, &registry(&log), file_sampler(&log), &ProgressReporter::new());
    assert!(matches!(
        result,
        Err(EngineError::Ghosts(GhostFileError::EmptyHistory))
    ));
    assert!(log.borrow().is_empty());
}

#[test]
fn ghost_indices_must_name_water_residues() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::write(dir.path(), "1,\n");
    let config = fixture.restart_config(short_run(1));
    let log = CallLog::default();

    let result = restart::run(&config, &registry(&log), file_sampler(&log), &ProgressReporter::new());
    assert!(matches!(
        result,
        Err(EngineError::Ghosts(GhostFileError::NotWater { index: 1, .. }))
    ));
}

#[test]
fn existing_outputs_are_not_overwritten() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::write(dir.path(), "5,\n");
    let config = fixture.restart_config(short_run(1));
    fs::write(&fixture.sampler_outputs().log_file, "previous run\n").unwrap();
    let log = CallLog::default();

    let result = restart::run(&config, &registry(&log), file_sampler(&log), &ProgressReporter::new());
    assert!(matches!(result, Err(EngineError::OutputExists(_))));
    assert_eq!(
        fs::read_to_string(&fixture.sampler_outputs().log_file).unwrap(),
        "previous run\n"
    );
}

#[test]
fn existing_state_log_is_not_overwritten() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::write(dir.path(), "5,\n");
    let config = fixture.restart_config(short_run(1));
    let state_log = dir.path().join("state.csv");
    fs::write(&state_log, "previous run state log\n").unwrap();
    let log = CallLog::default();

    let result = restart::run(&config, &registry(&log), file_sampler(&log), &ProgressReporter::new());
    assert!(matches!(result, Err(EngineError::OutputExists(path)) if path == state_log));
    assert_eq!(fs::read_to_string(&state_log).unwrap(), "previous run state log\n");
    assert!(log.borrow().is_empty());
}

#[test]
fn unknown_platform_is_reported() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::write(dir.path(), "5,\n");
    let mut config = fixture.restart_config(short_run(1));
    config.platform.name = "CUDA".to_string();
    let log = CallLog::default();

    let result = restart::run(&config, &registry(&log), file_sampler(&log), &ProgressReporter::new());
    match result {
        Err(EngineError::PlatformUnavailable { name, available }) => {
            assert_eq!(name, "CUDA");
            assert_eq!(available, vec!["Recording".to_string()]);
        }
        other => panic!("expected PlatformUnavailable, got {:?}", other),
    }
}

#[test]
fn progress_reports_phases_and_one_increment_per_cycle() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::write(dir.path(), "5,\n");
    let config = fixture.restart_config(short_run(2));
    let log = CallLog::default();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let reporter = ProgressReporter::with_callback(Box::new(move |event| {
        sink.lock().unwrap().push(event);
    }));

    restart::run(&config, &registry(&log), file_sampler(&log), &reporter).unwrap();

    let events = events.lock().unwrap();
    let phases: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            Progress::PhaseStart { name } => Some(*name),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec!["Loading inputs", "Preparing simulation", "GCMC/MD cycles"]);
    assert_eq!(
        events.iter().filter(|e| **e == Progress::TaskIncrement).count(),
        2
    );
    assert!(events.contains(&Progress::TaskStart { total_steps: 2 }));
}

#[test]
fn check_summarises_inputs_without_a_platform() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::write(dir.path(), "4,\n5,\n");
    let config = fixture.restart_config(short_run(1));

    let report = restart::check(&config, &ProgressReporter::new()).unwrap();
    assert_eq!(report.atoms, 15);
    assert_eq!(report.residues, 6);
    assert_eq!(report.waters, 3);
    assert_eq!(report.particles, 15);
    // Three C-H bonds plus three bonds per rigid water.
    assert_eq!(report.constraints, 12);
    assert_eq!(report.degrees_of_freedom, 45 - 12 - 3);
    assert!(report.total_charge.abs() < 1e-9);
    assert_eq!(report.history_frames, 2);
    assert_eq!(report.initial_ghosts, 1);
    assert_eq!(report.restart_time, Some(200.0));
    assert!(report.restart_has_velocities);
    assert!((report.sphere_centre.x - 1.5).abs() < 1e-6);
    assert_eq!(report.sphere_radius, 0.42);
}
