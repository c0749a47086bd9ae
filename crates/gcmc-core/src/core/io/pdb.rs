use super::slice_and_trim;
use crate::core::models::atom::Element;
use crate::core::models::cell::PeriodicBox;
use crate::core::models::residue::ResidueKind;
use crate::core::models::topology::{Topology, TopologyBuilder, TopologyError};
use crate::core::models::trajectory::{Frame, Trajectory};
use crate::core::units::{angstrom_to_nm, nm_to_angstrom};
use nalgebra::Point3;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Topology error on line {line}: {source}")]
    Topology {
        line: usize,
        #[source]
        source: TopologyError,
    },
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
}

/// One `ATOM`/`HETATM` line ready to be written.
///
/// Writers that emit atoms not present in any topology (sphere pseudo-atoms, cluster
/// centroids) build these directly.
#[derive(Debug, Clone, PartialEq)]
pub struct PdbAtomRecord<'a> {
    pub hetero: bool,
    pub serial: usize,
    pub name: &'a str,
    pub residue_name: &'a str,
    pub chain_id: char,
    pub residue_number: isize,
    /// Position in nm; converted to Å when written.
    pub position: Point3<f64>,
    pub occupancy: f64,
    pub temp_factor: f64,
    pub element: &'a str,
}

/// Reader and writer for Protein Data Bank files.
///
/// Reading builds the [`Topology`] from the first model and collects every model's
/// coordinates as a [`Frame`]; files without `MODEL` records yield a single frame.
pub struct PdbFile;

impl PdbFile {
    pub fn read_from(reader: &mut impl BufRead) -> Result<(Topology, Trajectory), PdbError> {
        let mut builder = TopologyBuilder::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut positions: Vec<Point3<f64>> = Vec::new();
        let mut current_box: Option<PeriodicBox> = None;
        let mut topology_box: Option<PeriodicBox> = None;
        let mut first_model_done = false;
        let mut atoms_in_first_model = 0usize;

        let mut current_chain: Option<char> = None;
        let mut current_residue: Option<(char, isize, char, String)> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "CRYST1" => {
                    let lengths = [
                        parse_float(&line, line_num, 6, 15, "7-15")?,
                        parse_float(&line, line_num, 15, 24, "16-24")?,
                        parse_float(&line, line_num, 24, 33, "25-33")?,
                    ];
                    let angles = [
                        parse_float(&line, line_num, 33, 40, "34-40")?,
                        parse_float(&line, line_num, 40, 47, "41-47")?,
                        parse_float(&line, line_num, 47, 54, "48-54")?,
                    ];
                    let cell = PeriodicBox::from_lengths_and_angles(
                        lengths.map(angstrom_to_nm),
                        angles,
                    );
                    if !first_model_done && topology_box.is_none() {
                        topology_box = Some(cell);
                    }
                    current_box = Some(cell);
                }
                "ATOM" | "HETATM" => {
                    let x = parse_float(&line, line_num, 30, 38, "31-38")?;
                    let y = parse_float(&line, line_num, 38, 46, "39-46")?;
                    let z = parse_float(&line, line_num, 46, 54, "47-54")?;
                    positions.push(Point3::new(x, y, z).map(angstrom_to_nm));

                    if first_model_done {
                        continue;
                    }

                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let residue_name = slice_and_trim(&line, 17, 21);
                    let chain_id = line.get(21..22).and_then(|s| s.chars().next()).unwrap_or(' ');
                    let residue_number: isize = parse_int(&line, line_num, 22, 26, "23-26")?;
                    let insertion_code =
                        line.get(26..27).and_then(|s| s.chars().next()).unwrap_or(' ');
                    // Serial numbers overflow in large solvated systems; fall back to file order.
                    let serial = slice_and_trim(&line, 6, 11)
                        .parse::<usize>()
                        .unwrap_or(atoms_in_first_model + 1);
                    let element = slice_and_trim(&line, 76, 78)
                        .parse::<Element>()
                        .unwrap_or_else(|_| Element::guess_from_atom_name(name));

                    if current_chain != Some(chain_id) {
                        builder.start_chain(chain_id);
                        current_chain = Some(chain_id);
                        current_residue = None;
                    }
                    let residue_key = (
                        chain_id,
                        residue_number,
                        insertion_code,
                        residue_name.to_string(),
                    );
                    if current_residue.as_ref() != Some(&residue_key) {
                        builder
                            .start_residue(residue_number, residue_name)
                            .map_err(|source| PdbError::Topology {
                                line: line_num,
                                source,
                            })?;
                        current_residue = Some(residue_key);
                    }
                    builder
                        .add_atom(name, serial, element)
                        .map_err(|source| PdbError::Topology {
                            line: line_num,
                            source,
                        })?;
                    atoms_in_first_model += 1;
                }
                "TER" => {
                    current_residue = None;
                }
                "ENDMDL" => {
                    push_frame(
                        &mut frames,
                        &mut positions,
                        current_box,
                        &mut first_model_done,
                        atoms_in_first_model,
                    )?;
                }
                _ => {}
            }
        }

        if !positions.is_empty() {
            push_frame(
                &mut frames,
                &mut positions,
                current_box,
                &mut first_model_done,
                atoms_in_first_model,
            )?;
        }

        if atoms_in_first_model == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM".to_string()));
        }

        if let Some(cell) = topology_box {
            builder.set_periodic_box(cell);
        }
        Ok((builder.build(), Trajectory::new(frames)))
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Topology, Trajectory), PdbError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Reads a topology together with the coordinates of its first model.
    pub fn read_structure<P: AsRef<Path>>(
        path: P,
    ) -> Result<(Topology, Vec<Point3<f64>>), PdbError> {
        let (topology, trajectory) = Self::read_from_path(path)?;
        let positions = trajectory
            .frames
            .into_iter()
            .next()
            .map(|frame| frame.positions)
            .unwrap_or_default();
        Ok((topology, positions))
    }

    pub fn write_remark(writer: &mut impl Write, text: &str) -> io::Result<()> {
        writeln!(writer, "REMARK {}", text)
    }

    pub fn write_cryst1(writer: &mut impl Write, cell: &PeriodicBox) -> io::Result<()> {
        let (lengths, angles) = cell.lengths_and_angles();
        let [a, b, c] = lengths.map(nm_to_angstrom);
        writeln!(
            writer,
            "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} P 1           1 ",
            a, b, c, angles[0], angles[1], angles[2]
        )
    }

    pub fn write_atom_record(writer: &mut impl Write, record: &PdbAtomRecord) -> io::Result<()> {
        let position = record.position.map(nm_to_angstrom);
        let residue_name = if record.residue_name.len() > 3 {
            record.residue_name.to_string()
        } else {
            format!("{:>3} ", record.residue_name)
        };
        writeln!(
            writer,
            "{:<6}{:>5} {} {}{}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}  ",
            if record.hetero { "HETATM" } else { "ATOM" },
            record.serial % 100_000,
            format_atom_name(record.name),
            residue_name,
            record.chain_id,
            record.residue_number.rem_euclid(10_000),
            position.x,
            position.y,
            position.z,
            record.occupancy,
            record.temp_factor,
            record.element,
        )
    }

    /// Writes every atom of `topology` at `positions`, followed by `TER` records
    /// between chains.
    pub fn write_atoms(
        writer: &mut impl Write,
        topology: &Topology,
        positions: &[Point3<f64>],
    ) -> Result<(), PdbError> {
        if positions.len() != topology.atom_count() {
            return Err(PdbError::Inconsistency(format!(
                "Topology has {} atoms but {} positions were given",
                topology.atom_count(),
                positions.len()
            )));
        }

        let mut serial = 1;
        for chain in topology.chains() {
            let mut last: Option<(&str, isize)> = None;
            for &residue_id in chain.residues() {
                let Some(residue) = topology.residue(residue_id) else {
                    continue;
                };
                for &atom_id in residue.atoms() {
                    let Some(atom) = topology.atom(atom_id) else {
                        continue;
                    };
                    Self::write_atom_record(
                        writer,
                        &PdbAtomRecord {
                            hetero: residue.kind != ResidueKind::Protein,
                            serial,
                            name: &atom.name,
                            residue_name: &residue.name,
                            chain_id: chain.id,
                            residue_number: residue.number,
                            position: positions[atom.index],
                            occupancy: 1.0,
                            temp_factor: 0.0,
                            element: atom.element.symbol(),
                        },
                    )?;
                    serial += 1;
                }
                last = Some((residue.name.as_str(), residue.number));
            }
            if let Some((name, number)) = last {
                writeln!(
                    writer,
                    "TER   {:>5}      {:>3} {}{:>4}",
                    serial % 100_000,
                    name,
                    chain.id,
                    number.rem_euclid(10_000)
                )?;
                serial += 1;
            }
        }
        Ok(())
    }

    /// Writes a trajectory as a multi-model PDB file.
    ///
    /// # Arguments
    ///
    /// * `writer` - Destination.
    /// * `topology` - Topology shared by every frame.
    /// * `trajectory` - Frames to write, one `MODEL` each.
    /// * `remarks` - Lines emitted as `REMARK` records before the first model.
    pub fn write_trajectory(
        writer: &mut impl Write,
        topology: &Topology,
        trajectory: &Trajectory,
        remarks: &[String],
    ) -> Result<(), PdbError> {
        for remark in remarks {
            Self::write_remark(writer, remark)?;
        }
        for (i, frame) in trajectory.frames.iter().enumerate() {
            if let Some(cell) = frame.periodic_box.as_ref() {
                Self::write_cryst1(writer, cell)?;
            }
            writeln!(writer, "MODEL     {:>4}", i + 1)?;
            Self::write_atoms(writer, topology, &frame.positions)?;
            writeln!(writer, "ENDMDL")?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }

    pub fn write_trajectory_to_path<P: AsRef<Path>>(
        path: P,
        topology: &Topology,
        trajectory: &Trajectory,
        remarks: &[String],
    ) -> Result<(), PdbError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_trajectory(&mut writer, topology, trajectory, remarks)?;
        writer.flush()?;
        Ok(())
    }
}

fn push_frame(
    frames: &mut Vec<Frame>,
    positions: &mut Vec<Point3<f64>>,
    periodic_box: Option<PeriodicBox>,
    first_model_done: &mut bool,
    expected_atoms: usize,
) -> Result<(), PdbError> {
    if positions.len() != expected_atoms {
        return Err(PdbError::Inconsistency(format!(
            "Model {} has {} atoms but the first model has {}",
            frames.len() + 1,
            positions.len(),
            expected_atoms
        )));
    }
    frames.push(Frame::new(std::mem::take(positions), periodic_box));
    *first_model_done = true;
    Ok(())
}

fn format_atom_name(name: &str) -> String {
    if name.len() >= 4 {
        name.chars().take(4).collect()
    } else {
        format!(" {:<3}", name)
    }
}

fn parse_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &str,
) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: columns.into(),
            value: value.into(),
        },
    })
}

fn parse_int(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &str,
) -> Result<isize, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: columns.into(),
            value: value.into(),
        },
    })
}
