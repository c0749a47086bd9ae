use super::context::SimulationContext;
use super::error::EngineError;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Observer invoked by [`Simulation::step`](super::simulation::Simulation::step).
pub trait Reporter {
    /// Report every `interval` steps; zero disables the reporter.
    fn interval(&self) -> u64;

    fn report(&mut self, context: &mut SimulationContext) -> Result<(), EngineError>;
}

const STATE_DATA_HEADER: [&str; 4] = [
    "Step",
    "Potential Energy (kJ/mole)",
    "Temperature (K)",
    "Box Volume (nm^3)",
];

/// Writes step, potential energy, temperature and box volume as CSV rows.
///
/// The header is written together with the first row. Every row is flushed so the log can
/// be followed while the run is in progress.
pub struct StateDataReporter<W: Write> {
    writer: csv::Writer<W>,
    interval: u64,
    header_written: bool,
    rows: usize,
}

impl<W: Write> StateDataReporter<W> {
    pub fn new(writer: W, interval: u64) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer),
            interval,
            header_written: false,
            rows: 0,
        }
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, EngineError> {
        self.writer
            .into_inner()
            .map_err(|e| EngineError::Io(e.into_error()))
    }
}

impl StateDataReporter<io::Stdout> {
    pub fn stdout(interval: u64) -> Self {
        Self::new(io::stdout(), interval)
    }
}

impl StateDataReporter<File> {
    /// Opens the state log at `path`.
    ///
    /// Without `overwrite` an existing file is kept and [`EngineError::OutputExists`] is
    /// returned.
    pub fn create<P: AsRef<Path>>(
        path: P,
        interval: u64,
        overwrite: bool,
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let file = if overwrite {
            File::create(path)?
        } else {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|e| match e.kind() {
                    io::ErrorKind::AlreadyExists => EngineError::OutputExists(path.to_path_buf()),
                    _ => EngineError::Io(e),
                })?
        };
        Ok(Self::new(file, interval))
    }
}

impl<W: Write> Reporter for StateDataReporter<W> {
    fn interval(&self) -> u64 {
        self.interval
    }

    fn report(&mut self, context: &mut SimulationContext) -> Result<(), EngineError> {
        if !self.header_written {
            self.writer.write_record(STATE_DATA_HEADER)?;
            self.header_written = true;
        }
        let step = context.state().step;
        let potential = context.potential_energy()?;
        let temperature = context.temperature();
        let volume = context
            .volume()
            .map(|v| format!("{:.4}", v))
            .unwrap_or_default();
        self.writer.write_record([
            step.to_string(),
            format!("{:.4}", potential),
            format!("{:.4}", temperature),
            volume,
        ])?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}
