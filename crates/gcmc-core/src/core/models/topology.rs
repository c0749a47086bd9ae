use super::atom::{Atom, Element};
use super::cell::PeriodicBox;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use slotmap::SlotMap;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Cannot add a residue before a chain has been started")]
    NoOpenChain,
    #[error("Cannot add atom '{0}' before a residue has been started")]
    NoOpenResidue(String),
}

/// The immutable atom/residue/chain hierarchy of a simulated system.
///
/// Atoms and residues are stored in slot maps keyed by stable ids, while separate order
/// vectors preserve the file order that coordinate arrays and ghost-water indices refer
/// to. A topology is built once through [`TopologyBuilder`] and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    chains: SlotMap<ChainId, Chain>,
    atom_order: Vec<AtomId>,
    residue_order: Vec<ResidueId>,
    chain_order: Vec<ChainId>,
    periodic_box: Option<PeriodicBox>,
}

impl Topology {
    pub fn atom_count(&self) -> usize {
        self.atom_order.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residue_order.len()
    }

    pub fn chain_count(&self) -> usize {
        self.chain_order.len()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Returns the atom at 0-based file position `index`.
    pub fn atom_by_index(&self, index: usize) -> Option<&Atom> {
        self.atom_order.get(index).and_then(|&id| self.atoms.get(id))
    }

    /// Returns the residue at 0-based file position `index`.
    pub fn residue_by_index(&self, index: usize) -> Option<&Residue> {
        self.residue_order
            .get(index)
            .and_then(|&id| self.residues.get(id))
    }

    /// Iterates over atoms in file order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> + '_ {
        self.atom_order.iter().filter_map(|&id| self.atoms.get(id))
    }

    /// Iterates over residues in file order.
    pub fn residues(&self) -> impl Iterator<Item = &Residue> + '_ {
        self.residue_order
            .iter()
            .filter_map(|&id| self.residues.get(id))
    }

    /// Iterates over chains in file order.
    pub fn chains(&self) -> impl Iterator<Item = &Chain> + '_ {
        self.chain_order.iter().filter_map(|&id| self.chains.get(id))
    }

    /// Returns the 0-based indices of the atoms of `residue`, in file order.
    pub fn residue_atom_indices(&self, residue: &Residue) -> Vec<usize> {
        residue
            .atoms()
            .iter()
            .filter_map(|&id| self.atoms.get(id))
            .map(|atom| atom.index)
            .collect()
    }

    /// Returns the residue an atom belongs to.
    pub fn residue_of(&self, atom: &Atom) -> Option<&Residue> {
        self.residues.get(atom.residue_id)
    }

    /// Finds every atom matching `name` inside residues named `resname` numbered `resid`.
    ///
    /// # Arguments
    ///
    /// * `name` - Atom name, compared exactly.
    /// * `resname` - Residue name, compared case-insensitively.
    /// * `resid` - Residue sequence number as written in the source file.
    ///
    /// # Return
    ///
    /// The 0-based indices of all matches, in file order. Several chains may carry the
    /// same residue number, so callers decide whether more than one match is acceptable.
    pub fn find_atoms(&self, name: &str, resname: &str, resid: isize) -> Vec<usize> {
        self.residues()
            .filter(|residue| residue.number == resid && residue.name.eq_ignore_ascii_case(resname))
            .flat_map(|residue| residue.atoms().iter())
            .filter_map(|&id| self.atoms.get(id))
            .filter(|atom| atom.name == name)
            .map(|atom| atom.index)
            .collect()
    }

    /// Returns the 0-based indices of all water residues.
    pub fn water_residue_indices(&self) -> Vec<usize> {
        self.residues()
            .filter(|residue| residue.is_water())
            .map(|residue| residue.index)
            .collect()
    }

    /// Maps every atom index to the index of its residue.
    pub fn atom_residue_indices(&self) -> Vec<usize> {
        self.atoms()
            .map(|atom| {
                self.residues
                    .get(atom.residue_id)
                    .map_or(usize::MAX, |residue| residue.index)
            })
            .collect()
    }

    pub fn periodic_box(&self) -> Option<&PeriodicBox> {
        self.periodic_box.as_ref()
    }
}

/// Incrementally assembles a [`Topology`] in file order.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    topology: Topology,
    chain_id_map: HashMap<char, ChainId>,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or reopens) the chain labelled `id`. Residues added next belong to it.
    pub fn start_chain(&mut self, id: char) -> &mut Self {
        let topology = &mut self.topology;
        let chain_id = *self.chain_id_map.entry(id).or_insert_with(|| {
            let index = topology.chain_order.len();
            let chain_id = topology.chains.insert(Chain::new(id, index));
            topology.chain_order.push(chain_id);
            chain_id
        });
        self.current_chain = Some(chain_id);
        self.current_residue = None;
        self
    }

    /// Starts a new residue in the current chain.
    ///
    /// Every call creates a new residue, even if `number` repeats: solvent boxes routinely
    /// wrap residue numbers past 9999.
    pub fn start_residue(&mut self, number: isize, name: &str) -> Result<&mut Self, TopologyError> {
        let chain_id = self.current_chain.ok_or(TopologyError::NoOpenChain)?;
        let index = self.topology.residue_order.len();
        let residue_id = self
            .topology
            .residues
            .insert(Residue::new(index, number, name, chain_id));
        self.topology.residue_order.push(residue_id);
        if let Some(chain) = self.topology.chains.get_mut(chain_id) {
            chain.residues.push(residue_id);
        }
        self.current_residue = Some(residue_id);
        Ok(self)
    }

    /// Adds an atom to the current residue and returns its 0-based index.
    pub fn add_atom(
        &mut self,
        name: &str,
        serial: usize,
        element: Element,
    ) -> Result<usize, TopologyError> {
        let residue_id = self
            .current_residue
            .ok_or_else(|| TopologyError::NoOpenResidue(name.to_string()))?;
        let index = self.topology.atom_order.len();
        let atom_id = self
            .topology
            .atoms
            .insert(Atom::new(name, index, serial, element, residue_id));
        self.topology.atom_order.push(atom_id);
        if let Some(residue) = self.topology.residues.get_mut(residue_id) {
            residue.add_atom(name, atom_id);
        }
        Ok(index)
    }

    pub fn set_periodic_box(&mut self, periodic_box: PeriodicBox) -> &mut Self {
        self.topology.periodic_box = Some(periodic_box);
        self
    }

    pub fn build(self) -> Topology {
        self.topology
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_topology() -> Topology {
        let mut builder = TopologyBuilder::new();
        builder.start_chain('A');
        builder.start_residue(10, "TYR").unwrap();
        builder.add_atom("N", 1, Element::N).unwrap();
        builder.add_atom("CA", 2, Element::C).unwrap();
        builder.start_residue(43, "ASN").unwrap();
        builder.add_atom("CA", 3, Element::C).unwrap();
        builder.start_chain('W');
        builder.start_residue(1, "HOH").unwrap();
        builder.add_atom("O", 4, Element::O).unwrap();
        builder.add_atom("H1", 5, Element::H).unwrap();
        builder.add_atom("H2", 6, Element::H).unwrap();
        builder.start_residue(2, "HOH").unwrap();
        builder.add_atom("O", 7, Element::O).unwrap();
        builder.set_periodic_box(PeriodicBox::orthorhombic(3.0, 3.0, 3.0));
        builder.build()
    }

    #[test]
    fn builder_preserves_file_order_indices() {
        let topology = small_topology();
        assert_eq!(topology.atom_count(), 7);
        assert_eq!(topology.residue_count(), 4);
        assert_eq!(topology.chain_count(), 2);
        let names: Vec<_> = topology.atoms().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["N", "CA", "CA", "O", "H1", "H2", "O"]);
        for (i, atom) in topology.atoms().enumerate() {
            assert_eq!(atom.index, i);
        }
        assert_eq!(topology.residue_by_index(2).map(|r| r.name.as_str()), Some("HOH"));
        assert!(topology.periodic_box().is_some());
    }

    #[test]
    fn find_atoms_matches_name_residue_name_and_number() {
        let topology = small_topology();
        assert_eq!(topology.find_atoms("CA", "TYR", 10), vec![1]);
        assert_eq!(topology.find_atoms("CA", "asn", 43), vec![2]);
        assert!(topology.find_atoms("CB", "TYR", 10).is_empty());
        assert!(topology.find_atoms("CA", "TYR", 11).is_empty());
    }

    #[test]
    fn water_residues_and_atom_residue_map() {
        let topology = small_topology();
        assert_eq!(topology.water_residue_indices(), vec![2, 3]);
        assert_eq!(topology.atom_residue_indices(), vec![0, 0, 1, 2, 2, 2, 3]);
        let water = topology.residue_by_index(2).unwrap();
        assert_eq!(topology.residue_atom_indices(water), vec![3, 4, 5]);
    }

    #[test]
    fn reopening_a_chain_appends_to_it() {
        let mut builder = TopologyBuilder::new();
        builder.start_chain('A');
        builder.start_residue(1, "ALA").unwrap();
        builder.start_chain('B');
        builder.start_residue(1, "GLY").unwrap();
        builder.start_chain('A');
        builder.start_residue(2, "SER").unwrap();
        let topology = builder.build();
        assert_eq!(topology.chain_count(), 2);
        let chain_a = topology.chains().next().unwrap();
        assert_eq!(chain_a.residues().len(), 2);
    }

    #[test]
    fn adding_without_open_scope_is_an_error() {
        let mut builder = TopologyBuilder::new();
        assert_eq!(
            builder.start_residue(1, "ALA").err(),
            Some(TopologyError::NoOpenChain)
        );
        builder.start_chain('A');
        assert_eq!(
            builder.add_atom("CA", 1, Element::C),
            Err(TopologyError::NoOpenResidue("CA".to_string()))
        );
    }
}
