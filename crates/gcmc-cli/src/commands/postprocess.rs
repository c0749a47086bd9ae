use crate::cli::PostprocessArgs;
use crate::config::builder::build_postprocess_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use gcmcflow::core::units::nm_to_angstrom;
use gcmcflow::engine::progress::ProgressReporter;
use gcmcflow::workflows::postprocess;
use tracing::info;

pub fn run(args: PostprocessArgs) -> Result<()> {
    let app = build_postprocess_config(&args)?;
    let config = app.postprocess;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Post-processing {} ({} ghost history)...",
        config.trajectory.display(),
        config.ghosts.display()
    );
    info!("Invoking the post-processing workflow...");
    let result = postprocess::run(&config, &reporter)?;

    info!(
        frames = result.frames,
        clusters = result.clusters,
        "Post-processing finished"
    );
    println!(
        "Processed {} frames (max CA RMSD after alignment {:.3} A).",
        result.frames,
        nm_to_angstrom(result.max_alignment_rmsd)
    );
    let outputs = &result.outputs;
    println!("  shifted:   {}", outputs.shifted.display());
    println!("  recentred: {}", outputs.recentred.display());
    println!("  aligned:   {}", outputs.aligned.display());
    println!(
        "  sphere:    {} ({} models)",
        outputs.sphere.display(),
        result.sphere_models
    );
    println!(
        "  clusters:  {} ({} sites)",
        outputs.clusters.display(),
        result.clusters
    );
    Ok(())
}
