//! Readers and writers for the files a restart consumes and the artifacts it produces.
//!
//! All readers convert to the crate's internal units on the way in (nm, ps) and all
//! writers convert back to the file format's native units (Å) on the way out.

pub mod ghosts;
pub mod pdb;
pub mod rst7;
pub mod trajectory;

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}
