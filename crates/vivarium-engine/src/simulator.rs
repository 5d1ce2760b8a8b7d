//! The free-running simulation worker.
//!
//! [`Simulator`] is the grid's sole writer. Its loop calls
//! [`Grid::iterate`] back to back with no sleep or backoff, publishing the
//! new `(generation, population)` pair after every step. The run flag is
//! checked between steps; an in-flight step is never interrupted.
//!
//! A step error (or a panic inside the grid) ends the loop. The worker
//! logs it, counts it, moves the running intent to `Stopped` and tells
//! listeners, so the host never believes a dead simulator is running.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error};
use vivarium_core::{Generation, Grid, GridError};

use crate::counters::PublishedCounters;
use crate::events::PipelineEvent;
use crate::metrics::MetricsCounters;
use crate::shared::Shared;
use crate::state::RunState;

/// Owns the write side of one grid.
pub struct Simulator {
    grid: Arc<dyn Grid>,
    counters: Arc<PublishedCounters>,
    shared: Arc<Shared>,
}

/// What the simulator thread hands back when it exits.
pub struct SimulatorExit {
    /// The simulator, ready to be relaunched.
    pub simulator: Simulator,
    /// Steps completed during this run.
    pub steps: u64,
    /// The error that ended the run, if any.
    pub error: Option<GridError>,
}

impl Simulator {
    /// A simulator advancing `grid` and publishing into `counters`.
    pub fn new(grid: Arc<dyn Grid>, counters: Arc<PublishedCounters>, shared: Arc<Shared>) -> Self {
        Self {
            grid,
            counters,
            shared,
        }
    }

    /// The grid being advanced.
    pub fn grid(&self) -> &Arc<dyn Grid> {
        &self.grid
    }

    /// Advance one generation and publish the result.
    pub fn step(&self) -> Result<Generation, GridError> {
        self.grid.iterate()?;
        let generation = self.grid.generation();
        self.counters.publish(generation, self.grid.population());
        MetricsCounters::bump(&self.shared.metrics.iterations);
        Ok(generation)
    }

    /// Step until `run_flag` is cleared. Returns the number of steps.
    pub fn run(&self, run_flag: &AtomicBool) -> Result<u64, GridError> {
        let mut steps = 0;
        self.run_counted(run_flag, &mut steps)?;
        Ok(steps)
    }

    fn run_counted(&self, run_flag: &AtomicBool, steps: &mut u64) -> Result<(), GridError> {
        while run_flag.load(Ordering::Acquire) {
            self.step()?;
            *steps += 1;
        }
        Ok(())
    }

    /// Run on a dedicated OS thread.
    ///
    /// `stopped` is set once the loop has exited, whatever the cause.
    pub(crate) fn spawn(
        self,
        run_flag: Arc<AtomicBool>,
        stopped: Arc<AtomicBool>,
    ) -> io::Result<JoinHandle<SimulatorExit>> {
        thread::Builder::new()
            .name("vivarium-simulator".into())
            .spawn(move || {
                debug!(generation = %self.counters.generation(), "simulator started");
                let mut steps = 0;
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| self.run_counted(&run_flag, &mut steps)))
                        .unwrap_or_else(|payload| {
                            Err(GridError::StepFailed {
                                reason: panic_reason(payload.as_ref()),
                            })
                        });
                let error = outcome.err();
                if let Some(err) = &error {
                    self.report_failure(err);
                } else {
                    debug!(steps, "simulator exited");
                }
                stopped.store(true, Ordering::Release);
                SimulatorExit {
                    simulator: self,
                    steps,
                    error,
                }
            })
    }

    fn report_failure(&self, err: &GridError) {
        error!(
            error = %err,
            generation = %self.counters.generation(),
            "simulator terminated"
        );
        MetricsCounters::bump(&self.shared.metrics.simulator_failures);
        if self
            .shared
            .state
            .transition(RunState::Running, RunState::Stopped)
        {
            self.shared.emit(PipelineEvent::RunningChanged(false));
        }
        self.shared.emit(PipelineEvent::SimulatorFailed {
            reason: err.to_string(),
        });
    }
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("grid panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("grid panicked: {s}")
    } else {
        "grid panicked".to_string()
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("size", &self.grid.size())
            .field("generation", &self.counters.generation())
            .finish()
    }
}
