use super::ids::ResidueId;
use phf::phf_map;
use std::fmt;
use std::str::FromStr;

/// Chemical element of an atom, as far as the workflow needs to know it.
///
/// Only hydrogens and water oxygens carry special meaning (hydrogen-bond constraints and
/// water clustering); the other variants exist so structure files round-trip cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Element {
    H,
    C,
    N,
    O,
    S,
    P,
    F,
    Cl,
    Br,
    I,
    Na,
    K,
    Mg,
    Ca,
    Zn,
    Fe,
    #[default]
    Unknown,
}

static ELEMENT_SYMBOLS: phf::Map<&'static str, Element> = phf_map! {
    "H" => Element::H,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "S" => Element::S,
    "P" => Element::P,
    "F" => Element::F,
    "CL" => Element::Cl,
    "BR" => Element::Br,
    "I" => Element::I,
    "NA" => Element::Na,
    "K" => Element::K,
    "MG" => Element::Mg,
    "CA" => Element::Ca,
    "ZN" => Element::Zn,
    "FE" => Element::Fe,
};

impl Element {
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::S => "S",
            Element::P => "P",
            Element::F => "F",
            Element::Cl => "Cl",
            Element::Br => "Br",
            Element::I => "I",
            Element::Na => "Na",
            Element::K => "K",
            Element::Mg => "Mg",
            Element::Ca => "Ca",
            Element::Zn => "Zn",
            Element::Fe => "Fe",
            Element::Unknown => "",
        }
    }

    /// Guesses the element from a PDB atom name when the element columns are blank.
    ///
    /// Leading digits are skipped (`1HB` is a hydrogen) and the first letter decides,
    /// which is the convention for protein and water atom names. Two-letter elements are
    /// only recognised when the name consists of nothing but the symbol (`NA`, `CL`), so a
    /// protein `CA` stays a carbon when the residue says otherwise; callers that know the
    /// residue should prefer [`Element::from_str`] on the element columns.
    pub fn guess_from_atom_name(name: &str) -> Self {
        let letters: String = name
            .trim()
            .chars()
            .skip_while(|c| c.is_ascii_digit())
            .collect();
        if letters.is_empty() {
            return Element::Unknown;
        }
        let upper = letters.to_ascii_uppercase();
        match upper.as_str() {
            "NA" | "CL" | "K" | "MG" | "ZN" | "FE" | "BR" => {
                return ELEMENT_SYMBOLS
                    .get(upper.as_str())
                    .copied()
                    .unwrap_or_default();
            }
            _ => {}
        }
        upper
            .get(..1)
            .and_then(|first| ELEMENT_SYMBOLS.get(first))
            .copied()
            .unwrap_or(Element::Unknown)
    }

    pub fn is_hydrogen(&self) -> bool {
        matches!(self, Element::H)
    }
}

impl FromStr for Element {
    type Err = ();

    /// Parses an element symbol, case-insensitively (`"Cl"`, `"CL"` and `"cl"` agree).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ELEMENT_SYMBOLS.get(upper.as_str()).copied().ok_or(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An atom of the topology.
///
/// Coordinates are deliberately not stored here: a topology is shared by every frame of a
/// trajectory and by the simulation context, each of which owns its own coordinate array
/// indexed by [`Atom::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "OW", "H1").
    pub name: String,
    /// 0-based position of the atom in file order.
    pub index: usize,
    /// Serial number as written in the source file.
    pub serial: usize,
    /// Chemical element.
    pub element: Element,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
}

impl Atom {
    pub fn new(name: &str, index: usize, serial: usize, element: Element, residue_id: ResidueId) -> Self {
        Self {
            name: name.to_string(),
            index,
            serial,
            element,
            residue_id,
        }
    }
}
