use gcmcflow::core::models::selection::AtomSelector;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid atom selector '{0}'. Expected 'ATOM:RESNAME RESNUM' (e.g., 'CA:TYR10').")]
    InvalidAtomSelector(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Component '{component}' cannot be empty in '{input}'.")]
    EmptyComponent {
        component: &'static str,
        input: String,
    },
}

/// Parses the compact selector form `ATOM:RESNAME<number>`, such as `CA:TYR10`.
///
/// The residue number is the trailing integer of the second component and may be
/// negative (`CA:ALA-3`).
pub fn parse_atom_selector(input: &str) -> Result<AtomSelector, ParseError> {
    let (atom, residue) = input
        .trim()
        .split_once(':')
        .ok_or_else(|| ParseError::InvalidAtomSelector(input.to_string()))?;
    let atom = atom.trim();
    if atom.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "atom name",
            input: input.to_string(),
        });
    }

    let residue = residue.trim();
    let digits_start = residue
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |i| i + 1);
    let number_start = if residue[..digits_start].ends_with('-') {
        digits_start - 1
    } else {
        digits_start
    };
    let (name, number) = residue.split_at(number_start);
    let name = name.trim();
    if name.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "residue name",
            input: input.to_string(),
        });
    }
    let number = number
        .parse::<isize>()
        .map_err(|_| ParseError::InvalidAtomSelector(input.to_string()))?;

    Ok(AtomSelector::new(atom, name, number))
}

/// Parses a comma-separated list of selectors (`CA:TYR10,CA:ASN43`).
pub fn parse_atom_selectors(input: &str) -> Result<Vec<AtomSelector>, ParseError> {
    input
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_atom_selector)
        .collect()
}

pub fn split_key_value(input: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidKeyValue(input.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "key",
            input: input.to_string(),
        });
    }
    Ok((key, value.trim()))
}
