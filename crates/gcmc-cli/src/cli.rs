use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "gcmcflow - restart, check and post-process GCMC/MD simulations of solvated proteins.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every restart input, build the system and summarise the run without a compute platform.
    Check(ConfigArgs),
    /// Turn a raw GCMC/MD trajectory into shifted, recentred, aligned, sphere and cluster artifacts.
    Postprocess(PostprocessArgs),
    /// Summarise a ghost-water history file.
    Ghosts(GhostsArgs),
}

/// Configuration sources shared by every config-driven subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to the run configuration file in TOML format.
    /// Built-in defaults are used for anything the file leaves out.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S run.cycles=50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `postprocess` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct PostprocessArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the raw trajectory to process (defaults to the sampler trajectory output).
    #[arg(short, long, value_name = "PATH")]
    pub trajectory: Option<PathBuf>,

    /// Override the ghost-water history (defaults to the sampler ghost output).
    #[arg(short, long, value_name = "PATH")]
    pub ghosts: Option<PathBuf>,

    /// Do not prepend the topology frame to the GCMC sphere trajectory.
    #[arg(long)]
    pub no_initial_frame: bool,
}

/// Arguments for the `ghosts` subcommand.
#[derive(Args, Debug, Clone)]
pub struct GhostsArgs {
    /// Ghost-water history file (one comma-terminated line of residue indices per frame).
    #[arg(value_name = "PATH")]
    pub file: PathBuf,

    /// Check the last frame against this topology (every index must be a water residue).
    #[arg(short, long, value_name = "PATH")]
    pub topology: Option<PathBuf>,
}
