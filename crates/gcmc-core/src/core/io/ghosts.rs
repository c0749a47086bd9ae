use crate::core::models::topology::Topology;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Residue indices of the water molecules that are currently switched off.
pub type GhostSet = BTreeSet<usize>;

#[derive(Debug, Error)]
pub enum GhostFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid residue index on line {line} (value: '{value}')")]
    InvalidIndex { line: usize, value: String },
    #[error("Residue index {index} appears twice on line {line}")]
    DuplicateIndex { line: usize, index: usize },
    #[error("Ghost history contains no frames")]
    EmptyHistory,
    #[error("Refusing to overwrite existing ghost file '{0}'")]
    AlreadyExists(PathBuf),
    #[error("Ghost residue index {index} is out of range (topology has {residues} residues)")]
    IndexOutOfRange { index: usize, residues: usize },
    #[error("Ghost residue index {index} refers to '{name}', which is not a water")]
    NotWater { index: usize, name: String },
}

/// Ghost sets recorded frame by frame during a previous run.
///
/// The text format holds one line per frame: comma-separated 0-based residue indices,
/// with a trailing comma. An empty line is a frame without ghosts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GhostHistory {
    pub frames: Vec<GhostSet>,
}

impl GhostHistory {
    pub fn new(frames: Vec<GhostSet>) -> Self {
        Self { frames }
    }

    pub fn read_from(reader: &mut impl BufRead) -> Result<Self, GhostFileError> {
        let mut frames = Vec::new();
        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            frames.push(parse_frame(&line, line_num + 1)?);
        }
        Ok(Self { frames })
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, GhostFileError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The ghost set of the most recent frame, which seeds a restarted run.
    pub fn last(&self) -> Result<&GhostSet, GhostFileError> {
        self.frames.last().ok_or(GhostFileError::EmptyHistory)
    }
}

/// Checks that every index in `ghosts` names a water residue of `topology`.
pub fn validate_ghosts(ghosts: &GhostSet, topology: &Topology) -> Result<(), GhostFileError> {
    let residues = topology.residue_count();
    for &index in ghosts {
        let residue = topology
            .residue_by_index(index)
            .ok_or(GhostFileError::IndexOutOfRange { index, residues })?;
        if !residue.is_water() {
            return Err(GhostFileError::NotWater {
                index,
                name: residue.name.clone(),
            });
        }
    }
    Ok(())
}

fn parse_frame(line: &str, line_num: usize) -> Result<GhostSet, GhostFileError> {
    let mut set = GhostSet::new();
    for token in line.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let index: usize = token.parse().map_err(|_| GhostFileError::InvalidIndex {
            line: line_num,
            value: token.to_string(),
        })?;
        if !set.insert(index) {
            return Err(GhostFileError::DuplicateIndex {
                line: line_num,
                index,
            });
        }
    }
    Ok(set)
}

/// Appends ghost sets to a history file, one line per frame.
pub struct GhostHistoryWriter<W: Write> {
    writer: W,
    frames_written: usize,
}

impl GhostHistoryWriter<BufWriter<File>> {
    /// Opens `path` for writing.
    ///
    /// With `overwrite == false` an existing file is left untouched and
    /// [`GhostFileError::AlreadyExists`] is returned.
    pub fn create<P: AsRef<Path>>(path: P, overwrite: bool) -> Result<Self, GhostFileError> {
        let path = path.as_ref();
        let file = if overwrite {
            File::create(path)?
        } else {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|e| match e.kind() {
                    io::ErrorKind::AlreadyExists => GhostFileError::AlreadyExists(path.to_path_buf()),
                    _ => GhostFileError::Io(e),
                })?
        };
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> GhostHistoryWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    /// Writes one frame and flushes, so the file stays usable if the run dies.
    pub fn write_frame(&mut self, ghosts: &GhostSet) -> Result<(), GhostFileError> {
        for index in ghosts {
            write!(self.writer, "{},", index)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
