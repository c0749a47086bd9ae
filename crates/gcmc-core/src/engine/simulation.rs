use super::context::SimulationContext;
use super::error::EngineError;
use super::reporters::Reporter;

/// A context plus the reporters that observe it while it is stepped.
pub struct Simulation {
    pub context: SimulationContext,
    reporters: Vec<Box<dyn Reporter>>,
}

impl Simulation {
    pub fn new(context: SimulationContext) -> Self {
        Self {
            context,
            reporters: Vec::new(),
        }
    }

    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) -> &mut Self {
        self.reporters.push(reporter);
        self
    }

    pub fn reporter_count(&self) -> usize {
        self.reporters.len()
    }

    pub fn current_step(&self) -> u64 {
        self.context.state().step
    }

    /// Advances `steps` integrator steps, pausing whenever the global step counter reaches
    /// a multiple of a reporter's interval to let that reporter observe the state.
    ///
    /// Reporters with an interval of zero never fire.
    pub fn step(&mut self, steps: u64) -> Result<(), EngineError> {
        let target = self.current_step() + steps;
        while self.current_step() < target {
            let now = self.current_step();
            let next_report = self
                .reporters
                .iter()
                .filter(|r| r.interval() > 0)
                .map(|r| now + r.interval() - now % r.interval())
                .min()
                .unwrap_or(target);
            let chunk = next_report.min(target) - now;
            self.context.step(chunk)?;

            let now = self.current_step();
            for reporter in self.reporters.iter_mut() {
                let interval = reporter.interval();
                if interval > 0 && now % interval == 0 {
                    reporter.report(&mut self.context)?;
                }
            }
        }
        Ok(())
    }
}
