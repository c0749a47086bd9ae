pub mod check;
pub mod ghosts;
pub mod postprocess;
