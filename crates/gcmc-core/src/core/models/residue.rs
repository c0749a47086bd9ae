use super::ids::{AtomId, ChainId};
use phf::phf_set;
use std::collections::HashMap;
use std::fmt;

static PROTEIN_RESIDUES: phf::Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "ASH", "CYS", "CYX", "CYM", "GLN", "GLU", "GLH", "GLY",
    "HIS", "HID", "HIE", "HIP", "HSD", "HSE", "HSP", "ILE", "LEU", "LYS", "LYN", "MET",
    "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL", "ACE", "NME",
};

static WATER_RESIDUES: phf::Set<&'static str> = phf_set! {
    "HOH", "WAT", "SOL", "TIP3", "TIP4", "TIP5", "T3P", "T4P", "SPC", "H2O",
};

static ION_RESIDUES: phf::Set<&'static str> = phf_set! {
    "NA", "CL", "K", "MG", "CA", "ZN", "NA+", "CL-", "K+", "SOD", "CLA", "POT",
};

/// Broad classification of a residue, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResidueKind {
    Protein,
    Water,
    Ion,
    Other,
}

impl ResidueKind {
    pub fn from_residue_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        if PROTEIN_RESIDUES.contains(upper.as_str()) {
            ResidueKind::Protein
        } else if WATER_RESIDUES.contains(upper.as_str()) {
            ResidueKind::Water
        } else if ION_RESIDUES.contains(upper.as_str()) {
            ResidueKind::Ion
        } else {
            ResidueKind::Other
        }
    }
}

impl fmt::Display for ResidueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ResidueKind::Protein => "Protein",
                ResidueKind::Water => "Water",
                ResidueKind::Ion => "Ion",
                ResidueKind::Other => "Other",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub index: usize,                       // 0-based position in file order
    pub number: isize,                      // Residue sequence number from source file
    pub name: String,                       // Name of the residue (e.g., "TYR", "HOH")
    pub kind: ResidueKind,                  // Classification derived from the name
    pub chain_id: ChainId,                  // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>,          // Atoms belonging to this residue, in file order
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(index: usize, number: isize, name: &str, chain_id: ChainId) -> Self {
        Self {
            index,
            number,
            name: name.to_string(),
            kind: ResidueKind::from_residue_name(name),
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// Returns the first atom carrying `name`, if any.
    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }

    pub fn is_water(&self) -> bool {
        self.kind == ResidueKind::Water
    }

    pub fn is_protein(&self) -> bool {
        self.kind == ResidueKind::Protein
    }
}
