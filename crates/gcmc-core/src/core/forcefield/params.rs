use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Nonbonded parameters shared by every atom of one type.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AtomType {
    /// Mass in daltons.
    pub mass: f64,
    /// Lennard-Jones size parameter in nm.
    pub sigma: f64,
    /// Lennard-Jones well depth in kJ/mol.
    pub epsilon: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TemplateAtom {
    pub name: String,
    #[serde(rename = "type")]
    pub atom_type: String,
    pub charge: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TemplateBond {
    pub atoms: [String; 2],
    /// Equilibrium length in nm.
    pub length: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResidueTemplate {
    pub atoms: Vec<TemplateAtom>,
    #[serde(default)]
    pub bonds: Vec<TemplateBond>,
}

impl ResidueTemplate {
    pub fn atom(&self, name: &str) -> Option<&TemplateAtom> {
        self.atoms.iter().find(|atom| atom.name == name)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ForceFieldFile {
    #[serde(default, rename = "atom-types")]
    atom_types: HashMap<String, AtomType>,
    #[serde(default)]
    residues: HashMap<String, ResidueTemplate>,
}

#[derive(Debug, Error)]
pub enum ForceFieldError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Atom type '{name}' in '{path}' is already defined by an earlier file")]
    DuplicateAtomType { name: String, path: String },
    #[error("Residue template '{name}' in '{path}' is already defined by an earlier file")]
    DuplicateTemplate { name: String, path: String },
    #[error("No force-field files were given")]
    NoFiles,
}

/// Atom types and residue templates merged from one or more parameter files.
#[derive(Debug, Clone, Default)]
pub struct ForceField {
    atom_types: HashMap<String, AtomType>,
    residues: HashMap<String, ResidueTemplate>,
}

impl ForceField {
    /// Loads and merges the given files in order.
    ///
    /// A later file may add atom types and templates but never redefine one.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ForceFieldError> {
        if paths.is_empty() {
            return Err(ForceFieldError::NoFiles);
        }
        let mut forcefield = Self::default();
        for path in paths {
            let path = path.as_ref();
            let label = path.to_string_lossy().to_string();
            let content = std::fs::read_to_string(path).map_err(|e| ForceFieldError::Io {
                path: label.clone(),
                source: e,
            })?;
            forcefield.merge_toml(&content, &label)?;
        }
        debug!(
            atom_types = forcefield.atom_types.len(),
            templates = forcefield.residues.len(),
            "Loaded force field"
        );
        Ok(forcefield)
    }

    /// Parses `content` and merges it into `self`. `label` names the source in errors.
    pub fn merge_toml(&mut self, content: &str, label: &str) -> Result<(), ForceFieldError> {
        let file: ForceFieldFile = toml::from_str(content).map_err(|e| ForceFieldError::Toml {
            path: label.to_string(),
            source: e,
        })?;

        let mut atom_types: Vec<_> = file.atom_types.into_iter().collect();
        atom_types.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, atom_type) in atom_types {
            if self.atom_types.contains_key(&name) {
                return Err(ForceFieldError::DuplicateAtomType {
                    name,
                    path: label.to_string(),
                });
            }
            self.atom_types.insert(name, atom_type);
        }

        let mut residues: Vec<_> = file.residues.into_iter().collect();
        residues.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, template) in residues {
            if self.residues.contains_key(&name) {
                return Err(ForceFieldError::DuplicateTemplate {
                    name,
                    path: label.to_string(),
                });
            }
            self.residues.insert(name, template);
        }
        Ok(())
    }

    pub fn atom_type(&self, name: &str) -> Option<&AtomType> {
        self.atom_types.get(name)
    }

    pub fn template(&self, name: &str) -> Option<&ResidueTemplate> {
        self.residues.get(name)
    }

    pub fn template_count(&self) -> usize {
        self.residues.len()
    }
}
