/// Events emitted by long-running workflows.
///
/// A phase groups related work ("Loading inputs", "GCMC/MD cycles"); a task inside a
/// phase has a known number of steps and reports each one as it completes.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// Short status text for the current task, e.g. the cycle just finished.
    StatusUpdate { text: String },
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `work` between a `PhaseStart`/`PhaseFinish` pair.
    ///
    /// `PhaseFinish` is only sent when `work` succeeds; a failing phase aborts the workflow.
    pub fn phase<T, E>(
        &self,
        name: &'static str,
        work: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        self.report(Progress::PhaseStart { name });
        let value = work()?;
        self.report(Progress::PhaseFinish);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_reporter() -> (ProgressReporter<'static>, Arc<Mutex<Vec<Progress>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));
        (reporter, events)
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::TaskIncrement);
    }

    #[test]
    fn phase_brackets_successful_work() {
        let (reporter, events) = recording_reporter();
        let value: Result<u32, ()> = reporter.phase("Loading", || Ok(7));
        assert_eq!(value, Ok(7));
        assert_eq!(
            *events.lock().unwrap(),
            vec![Progress::PhaseStart { name: "Loading" }, Progress::PhaseFinish]
        );
    }

    #[test]
    fn failed_phase_is_not_finished() {
        let (reporter, events) = recording_reporter();
        let value: Result<(), &str> = reporter.phase("Cycles", || Err("boom"));
        assert_eq!(value, Err("boom"));
        assert_eq!(
            *events.lock().unwrap(),
            vec![Progress::PhaseStart { name: "Cycles" }]
        );
    }
}
