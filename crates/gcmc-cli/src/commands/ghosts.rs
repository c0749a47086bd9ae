use crate::cli::GhostsArgs;
use crate::error::{CliError, Result};
use gcmcflow::core::io::ghosts::{GhostHistory, validate_ghosts};
use gcmcflow::core::io::pdb::PdbFile;
use gcmcflow::engine::error::EngineError;
use tracing::info;

/// Occupancy statistics of a ghost-water history.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostSummary {
    pub frames: usize,
    pub last_frame: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    /// Residue indices that are a ghost in every frame.
    pub always_ghost: Vec<usize>,
}

impl GhostSummary {
    pub fn from_history(history: &GhostHistory) -> Option<Self> {
        let last = history.frames.last()?;
        let counts: Vec<usize> = history.frames.iter().map(|f| f.len()).collect();
        let always_ghost = last
            .iter()
            .copied()
            .filter(|index| history.frames.iter().all(|f| f.contains(index)))
            .collect();
        Some(Self {
            frames: counts.len(),
            last_frame: last.len(),
            min: counts.iter().copied().min().unwrap_or(0),
            max: counts.iter().copied().max().unwrap_or(0),
            mean: counts.iter().sum::<usize>() as f64 / counts.len() as f64,
            always_ghost,
        })
    }
}

pub fn run(args: GhostsArgs) -> Result<()> {
    let history =
        GhostHistory::read_from_path(&args.file).map_err(|e| CliError::FileParsing {
            path: args.file.clone(),
            source: e.into(),
        })?;
    let summary = GhostSummary::from_history(&history).ok_or_else(|| {
        CliError::Argument(format!(
            "Ghost history '{}' contains no frames",
            args.file.display()
        ))
    })?;
    info!(frames = summary.frames, "Read ghost history");

    println!("{}", args.file.display());
    println!("  frames:              {}", summary.frames);
    println!("  ghosts (last frame): {}", summary.last_frame);
    println!(
        "  ghosts per frame:    min {}, max {}, mean {:.2}",
        summary.min, summary.max, summary.mean
    );
    println!("  ghost in every frame: {:?}", summary.always_ghost);

    if let Some(topology_path) = &args.topology {
        let (topology, _) =
            PdbFile::read_structure(topology_path).map_err(|e| CliError::FileParsing {
                path: topology_path.clone(),
                source: e.into(),
            })?;
        let last = history.last().map_err(EngineError::from)?;
        validate_ghosts(last, &topology).map_err(EngineError::from)?;
        println!(
            "  last frame is consistent with {}",
            topology_path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcmcflow::core::io::ghosts::GhostSet;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn summary_counts_ghosts_per_frame() {
        let history = GhostHistory::new(vec![
            GhostSet::from([3, 4, 5]),
            GhostSet::from([4, 5]),
            GhostSet::from([5, 7]),
        ]);
        let summary = GhostSummary::from_history(&history).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.last_frame, 2);
        assert_eq!(summary.min, 2);
        assert_eq!(summary.max, 3);
        assert!((summary.mean - 7.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.always_ghost, vec![5]);
    }

    #[test]
    fn empty_history_has_no_summary() {
        assert!(GhostSummary::from_history(&GhostHistory::new(Vec::new())).is_none());
    }

    #[test]
    fn run_reads_a_history_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gcmc-ghost-wats.txt");
        fs::write(&path, "3,4,\n4,\n").unwrap();

        let result = run(GhostsArgs {
            file: path,
            topology: None,
        });
        assert!(result.is_ok());
    }

    #[test]
    fn missing_file_is_a_parsing_error() {
        let result = run(GhostsArgs {
            file: PathBuf::from("/nonexistent/ghosts.txt"),
            topology: None,
        });
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
