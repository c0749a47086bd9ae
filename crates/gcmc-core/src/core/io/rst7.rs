use crate::core::models::cell::PeriodicBox;
use crate::core::models::state::RestartState;
use crate::core::units::{
    amber_velocity_to_nm_per_ps, angstrom_to_nm, nm_per_ps_to_amber_velocity, nm_to_angstrom,
};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

const FIELD_WIDTH: usize = 12;
const FIELDS_PER_LINE: usize = 6;

#[derive(Debug, Error)]
pub enum Rst7Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Restart file is missing its {0} line")]
    MissingHeader(&'static str),
    #[error("Invalid atom count on line 2 (value: '{0}')")]
    InvalidAtomCount(String),
    #[error("Invalid time on line 2 (value: '{0}')")]
    InvalidTime(String),
    #[error("Invalid number on line {line}, field {field} (value: '{value}')")]
    InvalidFloat {
        line: usize,
        field: usize,
        value: String,
    },
    #[error("Restart block for {atoms} atoms holds {found} values; expected three per atom")]
    FieldCount { atoms: usize, found: usize },
    #[error(
        "Restart file for {atoms} atoms has {found} data lines; expected {coordinate_lines} \
         for coordinates plus as many for velocities and one for the box"
    )]
    LineCount {
        atoms: usize,
        coordinate_lines: usize,
        found: usize,
    },
    #[error("Velocity count ({velocities}) does not match position count ({positions})")]
    VelocityMismatch { positions: usize, velocities: usize },
}

/// Reader and writer for Amber ASCII restart (`.rst7` / `.inpcrd`) files.
///
/// Layout: a title line, a line holding the atom count and optional time (ps), then
/// fixed-width 12-character fields six per line: coordinates (Å), optional velocities
/// (Å per 1/20.455 ps), and an optional box line (three lengths in Å, three angles in
/// degrees).
pub struct Rst7File;

impl Rst7File {
    pub fn read_from(reader: &mut impl BufRead) -> Result<RestartState, Rst7Error> {
        let mut lines = reader.lines();

        let title = lines
            .next()
            .transpose()?
            .ok_or(Rst7Error::MissingHeader("title"))?;
        let header = lines
            .next()
            .transpose()?
            .ok_or(Rst7Error::MissingHeader("atom count"))?;

        let mut tokens = header.split_whitespace();
        let count_token = tokens.next().unwrap_or("");
        let atoms: usize = count_token
            .parse()
            .map_err(|_| Rst7Error::InvalidAtomCount(count_token.to_string()))?;
        let time = match tokens.next() {
            Some(token) => Some(
                parse_fortran_float(token).ok_or_else(|| Rst7Error::InvalidTime(token.to_string()))?,
            ),
            None => None,
        };

        let mut data_lines = Vec::new();
        for (offset, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let line_num = offset + 3;
            let mut values = Vec::with_capacity(FIELDS_PER_LINE);
            for (field, chunk) in fixed_width_fields(&line).enumerate() {
                let value = parse_fortran_float(chunk).ok_or_else(|| Rst7Error::InvalidFloat {
                    line: line_num,
                    field: field + 1,
                    value: chunk.to_string(),
                })?;
                values.push(value);
            }
            data_lines.push(values);
        }

        // Each block starts on a fresh line, so the layout follows from the line count.
        // With one coordinate line a single trailing six-field line reads as the box.
        let coordinate_lines = (3 * atoms).div_ceil(FIELDS_PER_LINE);
        let last_is_box = data_lines
            .last()
            .is_some_and(|values| values.len() == FIELDS_PER_LINE);
        let (has_velocities, has_box) = match data_lines.len() {
            n if n == coordinate_lines => (false, false),
            n if n == coordinate_lines + 1 && last_is_box => (false, true),
            n if n == 2 * coordinate_lines + 1 && last_is_box => (true, true),
            n if n == 2 * coordinate_lines => (true, false),
            found => {
                return Err(Rst7Error::LineCount {
                    atoms,
                    coordinate_lines,
                    found,
                })
            }
        };

        let (coordinate_block, rest) = data_lines.split_at(coordinate_lines);
        let coordinates = flatten_block(coordinate_block, atoms)?;
        let positions = coordinates
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]).map(angstrom_to_nm))
            .collect();
        let mut state = RestartState::new(positions).with_title(title.trim_end());

        if has_velocities {
            let velocities = flatten_block(&rest[..coordinate_lines], atoms)?
                .chunks_exact(3)
                .map(|c| Vector3::new(c[0], c[1], c[2]).map(amber_velocity_to_nm_per_ps))
                .collect();
            state = state.with_velocities(velocities);
        }
        if has_box {
            if let Some(b) = rest.last() {
                state = state.with_box(PeriodicBox::from_lengths_and_angles(
                    [b[0], b[1], b[2]].map(angstrom_to_nm),
                    [b[3], b[4], b[5]],
                ));
            }
        }
        if let Some(time) = time {
            state = state.with_time(time);
        }
        Ok(state)
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<RestartState, Rst7Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    pub fn write_to(state: &RestartState, writer: &mut impl Write) -> Result<(), Rst7Error> {
        let title: String = state.title.chars().take(80).collect();
        writeln!(writer, "{}", title)?;
        match state.time {
            Some(time) => writeln!(writer, "{:>6}{:>15}", state.positions.len(), format_sci(time, 7))?,
            None => writeln!(writer, "{:>6}", state.positions.len())?,
        }

        let coordinates = state
            .positions
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .map(nm_to_angstrom);
        write_fields(writer, coordinates)?;

        if let Some(velocities) = &state.velocities {
            if velocities.len() != state.positions.len() {
                return Err(Rst7Error::VelocityMismatch {
                    positions: state.positions.len(),
                    velocities: velocities.len(),
                });
            }
            let values = velocities
                .iter()
                .flat_map(|v| [v.x, v.y, v.z])
                .map(nm_per_ps_to_amber_velocity);
            write_fields(writer, values)?;
        }

        if let Some(cell) = &state.periodic_box {
            let (lengths, angles) = cell.lengths_and_angles();
            let values = lengths
                .map(nm_to_angstrom)
                .into_iter()
                .chain(angles);
            write_fields(writer, values)?;
        }
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(state: &RestartState, path: P) -> Result<(), Rst7Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(state, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn fixed_width_fields(line: &str) -> impl Iterator<Item = &str> + '_ {
    (0..line.len())
        .step_by(FIELD_WIDTH)
        .filter_map(move |start| line.get(start..(start + FIELD_WIDTH).min(line.len())))
        .map(str::trim)
        .filter(|field| !field.is_empty())
}

fn flatten_block(block: &[Vec<f64>], atoms: usize) -> Result<Vec<f64>, Rst7Error> {
    let values: Vec<f64> = block.iter().flatten().copied().collect();
    if values.len() != 3 * atoms {
        return Err(Rst7Error::FieldCount {
            atoms,
            found: values.len(),
        });
    }
    Ok(values)
}

fn parse_fortran_float(token: &str) -> Option<f64> {
    let token = token.trim();
    token
        .parse()
        .ok()
        .or_else(|| token.replace(['D', 'd'], "E").parse().ok())
}

fn write_fields(writer: &mut impl Write, values: impl Iterator<Item = f64>) -> io::Result<()> {
    let mut in_line = 0;
    for value in values {
        write!(writer, "{:>12.7}", value)?;
        in_line += 1;
        if in_line == FIELDS_PER_LINE {
            writeln!(writer)?;
            in_line = 0;
        }
    }
    if in_line > 0 {
        writeln!(writer)?;
    }
    Ok(())
}

/// Formats `value` like C's `%.{precision}e` (`1.0000000e+02`).
fn format_sci(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}
