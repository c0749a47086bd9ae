use super::topology::Topology;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No atom matches {0}")]
    NotFound(AtomSelector),
    #[error("{count} atoms match {selector}; the selection must be unique")]
    Ambiguous { selector: AtomSelector, count: usize },
}

/// Picks a single atom by atom name, residue name and residue number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomSelector {
    pub name: String,
    pub residue_name: String,
    pub residue_number: isize,
}

impl AtomSelector {
    pub fn new(name: &str, residue_name: &str, residue_number: isize) -> Self {
        Self {
            name: name.to_string(),
            residue_name: residue_name.to_string(),
            residue_number,
        }
    }

    /// Returns the 0-based index of the one atom this selector matches.
    pub fn resolve(&self, topology: &Topology) -> Result<usize, SelectionError> {
        let matches = topology.find_atoms(&self.name, &self.residue_name, self.residue_number);
        match matches.as_slice() {
            [index] => Ok(*index),
            [] => Err(SelectionError::NotFound(self.clone())),
            _ => Err(SelectionError::Ambiguous {
                selector: self.clone(),
                count: matches.len(),
            }),
        }
    }
}

impl fmt::Display for AtomSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}{}",
            self.name, self.residue_name, self.residue_number
        )
    }
}
