//! Lifecycle orchestration for the simulate/render pipeline.
//!
//! [`Controller`] owns the grid, the parked [`Simulator`] and
//! [`Sampler`], and the worker threads while they run. It maps the user's
//! `start`/`stop`/`reset` and the host's `on_pause`/`on_resume` onto a
//! three-state running intent:
//!
//! ```text
//!              start / on_resume
//!   Stopped ─────────────────────► Running
//!      ▲  ◄──── stop / reset ─────   │  ▲
//!      │       / sim failure         │  │ on_resume
//!      │                    on_pause ▼  │
//!      └──────── stop / reset ──── PausedRunning
//! ```
//!
//! Teardown clears the simulator's run flag, revokes the sampler's
//! schedule token, drops the cancel channel and joins both threads within
//! [`PipelineConfig::teardown_timeout`]. Workers hand their state back
//! through their `JoinHandle`, so the color table, frame buffers and last
//! rendered generation survive a pause.
//!
//! A worker that does not stop in time is detached and the controller
//! becomes faulted: `start`/`on_resume` fail with
//! [`ControlError::Faulted`] until `reset` or `set_grid` replaces the grid.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use vivarium_core::{Generation, Grid, GridError, GridFactory};
use vivarium_grid::LifeGridFactory;
use vivarium_render::{ColorParams, Frame, FrameSlot, RenderError};

use crate::config::{density_fraction, validate_density, ConfigError, PipelineConfig};
use crate::counters::PublishedCounters;
use crate::events::PipelineEvent;
use crate::metrics::PipelineMetrics;
use crate::sampler::{SampleOutcome, Sampler};
use crate::schedule::Schedule;
use crate::shared::Shared;
use crate::simulator::{Simulator, SimulatorExit};
use crate::state::RunState;

// ── ControlError ───────────────────────────────────────────────────

/// Errors returned by [`Controller`] operations.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ControlError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The grid could not be built or stepped.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// Buffers for a new grid could not be allocated.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// `start` was called with no grid installed.
    #[error("no grid installed")]
    NoGrid,
    /// A worker did not stop within the teardown timeout.
    #[error("{component} did not stop within {waited_ms} ms")]
    TeardownTimeout {
        /// `"simulator"` or `"sampler"`.
        component: &'static str,
        /// How long teardown waited.
        waited_ms: u64,
    },
    /// A previous teardown timed out; install a new grid first.
    #[error("controller is faulted; reset or install a new grid")]
    Faulted,
    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn {name} thread: {reason}")]
    ThreadSpawnFailed {
        /// Thread name.
        name: &'static str,
        /// OS error text.
        reason: String,
    },
}

// ── Workers ────────────────────────────────────────────────────────

/// Live worker threads and the handles needed to stop them.
struct Workers {
    run_flag: Arc<AtomicBool>,
    cancel_tx: Option<Sender<()>>,
    simulator_stopped: Arc<AtomicBool>,
    simulator: JoinHandle<SimulatorExit>,
    sampler: JoinHandle<Sampler>,
}

impl Workers {
    fn finished(&self) -> bool {
        self.simulator.is_finished() && self.sampler.is_finished()
    }

    fn laggard(&self) -> &'static str {
        if self.simulator.is_finished() {
            "sampler"
        } else {
            "simulator"
        }
    }
}

// ── Controller ─────────────────────────────────────────────────────

/// Owner of the grid and the two pipeline workers.
///
/// # Example
///
/// ```no_run
/// use vivarium_engine::{Controller, PipelineConfig};
///
/// let mut controller = Controller::new(PipelineConfig::default()).unwrap();
/// controller.on_generation_published(|generation, population| {
///     println!("generation {generation}: {population} alive");
/// });
/// controller.start().unwrap();
/// std::thread::sleep(std::time::Duration::from_millis(100));
/// controller.stop().unwrap();
/// ```
pub struct Controller {
    config: PipelineConfig,
    factory: Box<dyn GridFactory>,
    rng: ChaCha8Rng,
    density_percent: u8,
    grid: Option<Arc<dyn Grid>>,
    counters: Arc<PublishedCounters>,
    simulator: Option<Simulator>,
    sampler: Option<Sampler>,
    shared: Arc<Shared>,
    schedule: Schedule,
    workers: Option<Workers>,
    faulted: bool,
}

// Compile-time assertion: Controller must be Send.
const _: fn() = || {
    fn assert<T: Send>() {}
    assert::<Controller>();
};

impl Controller {
    /// Build a controller over [`LifeGridFactory`] and generate the
    /// first grid.
    pub fn new(config: PipelineConfig) -> Result<Self, ControlError> {
        Self::with_factory(config, Box::new(LifeGridFactory))
    }

    /// Build a controller that generates grids through `factory`.
    pub fn with_factory(
        config: PipelineConfig,
        factory: Box<dyn GridFactory>,
    ) -> Result<Self, ControlError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut controller = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            density_percent: config.density_percent,
            grid: None,
            counters: Arc::new(PublishedCounters::default()),
            simulator: None,
            sampler: None,
            shared: Arc::new(Shared::new(config.colors)),
            schedule: Schedule::new(),
            workers: None,
            faulted: false,
            factory,
            config,
        };
        controller.reset()?;
        Ok(controller)
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Launch the simulator and sampler.
    ///
    /// No-op while already running. Fails with [`ControlError::NoGrid`]
    /// when no grid is installed.
    pub fn start(&mut self) -> Result<(), ControlError> {
        if self.faulted {
            return Err(ControlError::Faulted);
        }
        if self.shared.state.load() == RunState::Running && self.is_simulating() {
            warn!("start ignored: already running");
            return Ok(());
        }
        if self.grid.is_none() {
            return Err(ControlError::NoGrid);
        }
        // Reap workers left behind by a failed simulator.
        self.teardown()?;

        let prev = self.shared.state.swap(RunState::Running);
        if !prev.running_intent() {
            self.shared.emit(PipelineEvent::RunningChanged(true));
        }
        if let Err(err) = self.launch() {
            self.drop_intent();
            return Err(err);
        }
        info!(generation = %self.generation(), "pipeline started");
        Ok(())
    }

    /// Stop both workers and clear the running intent.
    ///
    /// On return no worker writes the counters or the frame slot again.
    pub fn stop(&mut self) -> Result<(), ControlError> {
        let result = self.teardown();
        if self.drop_intent() {
            info!(generation = %self.generation(), "pipeline stopped");
        }
        result
    }

    /// Stop, then replace the grid with a freshly generated one at the
    /// configured size and current density. Leaves the state `Stopped`.
    ///
    /// On error the previous grid, counters and frame are kept.
    pub fn reset(&mut self) -> Result<(), ControlError> {
        if let Err(err) = self.stop() {
            warn!(error = %err, "reset discarding unresponsive workers");
        }
        let seed: u64 = self.rng.random();
        let grid = self.factory.create(
            self.config.grid_size,
            density_fraction(self.density_percent),
            seed,
        )?;
        info!(
            size = self.config.grid_size,
            density_percent = self.density_percent,
            seed,
            "grid reset"
        );
        self.install(Some(grid))
    }

    /// Stop, then install `grid` (or clear the grid with `None`).
    ///
    /// Buffers for the new grid are allocated before anything is replaced,
    /// so on error the previous grid, counters and frame are kept.
    pub fn set_grid(&mut self, grid: Option<Arc<dyn Grid>>) -> Result<(), ControlError> {
        if let Err(err) = self.stop() {
            warn!(error = %err, "set_grid discarding unresponsive workers");
        }
        self.install(grid)
    }

    /// Host lifecycle pause.
    ///
    /// From `Running`, tears the workers down and moves to
    /// `PausedRunning`. Otherwise a no-op.
    pub fn on_pause(&mut self) -> Result<(), ControlError> {
        if self.shared.state.load() != RunState::Running {
            return Ok(());
        }
        if let Err(err) = self.teardown() {
            self.drop_intent();
            return Err(err);
        }
        if self
            .shared
            .state
            .transition(RunState::Running, RunState::PausedRunning)
        {
            info!(generation = %self.generation(), "pipeline paused by host");
        }
        Ok(())
    }

    /// Host lifecycle resume.
    ///
    /// From `PausedRunning`, relaunches the workers. Otherwise a no-op.
    pub fn on_resume(&mut self) -> Result<(), ControlError> {
        if self.shared.state.load() != RunState::PausedRunning {
            return Ok(());
        }
        if self.faulted {
            return Err(ControlError::Faulted);
        }
        self.shared.state.swap(RunState::Running);
        if let Err(err) = self.launch() {
            self.drop_intent();
            return Err(err);
        }
        info!(generation = %self.generation(), "pipeline resumed by host");
        Ok(())
    }

    /// Sample once on the caller's thread if no sampler thread is live.
    ///
    /// Returns `None` when workers are running or no grid is installed.
    pub fn refresh(&mut self) -> Result<Option<SampleOutcome>, ControlError> {
        if self.workers.is_some() {
            return Ok(None);
        }
        match self.sampler.as_mut() {
            Some(sampler) => Ok(Some(sampler.sample()?)),
            None => Ok(None),
        }
    }

    // ── Settings ───────────────────────────────────────────────────

    /// Set the hue in degrees.
    pub fn set_hue(&self, hue: f32) {
        self.shared.colors.set_hue(hue);
    }

    /// Set the saturation.
    pub fn set_saturation(&self, saturation: f32) {
        self.shared.colors.set_saturation(saturation);
    }

    /// Set the brightness of newborn cells.
    pub fn set_new_brightness(&self, brightness: f32) {
        self.shared.colors.set_new_brightness(brightness);
    }

    /// Set the brightness approached by the oldest cells.
    pub fn set_old_brightness(&self, brightness: f32) {
        self.shared.colors.set_old_brightness(brightness);
    }

    /// Set all four color parameters.
    pub fn set_color_params(
        &self,
        hue: f32,
        saturation: f32,
        new_brightness: f32,
        old_brightness: f32,
    ) {
        self.shared.colors.set_params(ColorParams {
            hue,
            saturation,
            new_brightness,
            old_brightness,
        });
    }

    /// Current color parameters.
    pub fn color_params(&self) -> ColorParams {
        self.shared.colors.params()
    }

    /// Density percentage used by the next [`reset`](Self::reset).
    pub fn set_density(&mut self, percent: u8) -> Result<(), ControlError> {
        validate_density(percent)?;
        self.density_percent = percent;
        Ok(())
    }

    // ── Listeners ──────────────────────────────────────────────────

    /// Register a callback for every [`PipelineEvent`].
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.shared.listeners.subscribe(Arc::new(listener));
    }

    /// Called with `(generation, population)` after each presented frame.
    pub fn on_generation_published<F>(&self, listener: F)
    where
        F: Fn(Generation, usize) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let PipelineEvent::FramePublished {
                generation,
                population,
            } = event
            {
                listener(*generation, *population);
            }
        });
    }

    /// Called when a never-iterated grid has been drawn.
    pub fn on_repaint_requested<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if *event == PipelineEvent::RepaintRequested {
                listener();
            }
        });
    }

    /// Called whenever the running intent flips.
    pub fn on_running_changed<F>(&self, listener: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let PipelineEvent::RunningChanged(running) = event {
                listener(*running);
            }
        });
    }

    // ── Observers ──────────────────────────────────────────────────

    /// Current state.
    pub fn state(&self) -> RunState {
        self.shared.state.load()
    }

    /// Running intent: true in `Running` and `PausedRunning`.
    pub fn running(&self) -> bool {
        self.state().running_intent()
    }

    /// Whether a simulator thread is alive and stepping.
    pub fn is_simulating(&self) -> bool {
        self.workers
            .as_ref()
            .is_some_and(|w| !w.simulator_stopped.load(Ordering::Acquire))
    }

    /// Whether a previous teardown timed out.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Latest published generation.
    pub fn generation(&self) -> Generation {
        self.counters.generation()
    }

    /// Latest published population.
    pub fn population(&self) -> usize {
        self.counters.population()
    }

    /// Most recently presented frame.
    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.shared.frames.latest()
    }

    /// The frame hand-off slot, for presenters on other threads.
    pub fn frame_slot(&self) -> Arc<FrameSlot> {
        Arc::clone(&self.shared.frames)
    }

    /// The installed grid.
    pub fn grid(&self) -> Option<&Arc<dyn Grid>> {
        self.grid.as_ref()
    }

    /// Side length of the installed grid.
    pub fn grid_size(&self) -> Option<usize> {
        self.grid.as_ref().map(|g| g.size())
    }

    /// Density percentage used by the next reset.
    pub fn density_percent(&self) -> u8 {
        self.density_percent
    }

    /// Throughput counters.
    pub fn metrics(&self) -> PipelineMetrics {
        self.shared.metrics.snapshot()
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Move to `Stopped`, notifying listeners if the intent was set.
    /// Returns whether the intent changed.
    fn drop_intent(&self) -> bool {
        let prev = self.shared.state.swap(RunState::Stopped);
        if prev.running_intent() {
            self.shared.emit(PipelineEvent::RunningChanged(false));
            true
        } else {
            false
        }
    }

    /// Replace the grid. Allocates and draws the first frame before
    /// mutating, so an error leaves the previous grid in place.
    fn install(&mut self, grid: Option<Arc<dyn Grid>>) -> Result<(), ControlError> {
        debug_assert!(self.workers.is_none(), "install with live workers");
        match grid {
            Some(grid) => {
                let counters = Arc::new(PublishedCounters::new(
                    grid.generation(),
                    grid.population(),
                ));
                let mut sampler = Sampler::new(
                    Arc::clone(&grid),
                    Arc::clone(&counters),
                    Arc::clone(&self.shared),
                )?;
                sampler.sample()?;
                let simulator = Simulator::new(
                    Arc::clone(&grid),
                    Arc::clone(&counters),
                    Arc::clone(&self.shared),
                );
                debug!(size = grid.size(), generation = %grid.generation(), "grid installed");
                self.grid = Some(grid);
                self.counters = counters;
                self.sampler = Some(sampler);
                self.simulator = Some(simulator);
                self.faulted = false;
            }
            None => {
                self.grid = None;
                self.counters = Arc::new(PublishedCounters::default());
                self.sampler = None;
                self.simulator = None;
                self.faulted = false;
                self.shared.frames.clear();
                debug!("grid cleared");
            }
        }
        Ok(())
    }

    /// Spawn both workers from the parked components.
    fn launch(&mut self) -> Result<(), ControlError> {
        let grid = self.grid.as_ref().ok_or(ControlError::NoGrid)?;
        let sampler = match self.sampler.take() {
            Some(sampler) => sampler,
            None => Sampler::new(
                Arc::clone(grid),
                Arc::clone(&self.counters),
                Arc::clone(&self.shared),
            )?,
        };
        let simulator = self.simulator.take().unwrap_or_else(|| {
            Simulator::new(
                Arc::clone(grid),
                Arc::clone(&self.counters),
                Arc::clone(&self.shared),
            )
        });

        let run_flag = Arc::new(AtomicBool::new(true));
        let simulator_stopped = Arc::new(AtomicBool::new(false));
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(1);

        // Sampler first: it exits as soon as the cancel channel drops, so
        // it is the cheap one to unwind if the simulator cannot spawn.
        let sampler = sampler
            .spawn(
                self.config.sample_period,
                cancel_rx,
                self.schedule.issue(),
                Arc::clone(&run_flag),
                Arc::clone(&simulator_stopped),
            )
            .map_err(|e| ControlError::ThreadSpawnFailed {
                name: "vivarium-sampler",
                reason: e.to_string(),
            })?;
        let simulator =
            match simulator.spawn(Arc::clone(&run_flag), Arc::clone(&simulator_stopped)) {
                Ok(handle) => handle,
                Err(e) => {
                    self.schedule.revoke();
                    drop(cancel_tx);
                    if let Ok(sampler) = sampler.join() {
                        self.sampler = Some(sampler);
                    }
                    return Err(ControlError::ThreadSpawnFailed {
                        name: "vivarium-simulator",
                        reason: e.to_string(),
                    });
                }
            };

        self.workers = Some(Workers {
            run_flag,
            cancel_tx: Some(cancel_tx),
            simulator_stopped,
            simulator,
            sampler,
        });
        Ok(())
    }

    /// Stop and join the workers, recovering their state.
    fn teardown(&mut self) -> Result<(), ControlError> {
        let Some(mut workers) = self.workers.take() else {
            return Ok(());
        };
        let started = Instant::now();
        workers.run_flag.store(false, Ordering::Release);
        self.schedule.revoke();
        workers.cancel_tx.take();

        let timeout = self.config.teardown_timeout;
        let deadline = started + timeout;
        while !workers.finished() {
            if Instant::now() >= deadline {
                let component = workers.laggard();
                let waited_ms = timeout.as_millis() as u64;
                error!(component, waited_ms, "worker did not stop; controller faulted");
                self.faulted = true;
                // Dropping the handles detaches the threads.
                drop(workers);
                return Err(ControlError::TeardownTimeout {
                    component,
                    waited_ms,
                });
            }
            thread::sleep(Duration::from_millis(1));
        }

        match workers.simulator.join() {
            Ok(exit) => {
                debug!(steps = exit.steps, failed = exit.error.is_some(), "simulator joined");
                self.simulator = Some(exit.simulator);
            }
            Err(_) => error!("simulator thread panicked"),
        }
        match workers.sampler.join() {
            Ok(sampler) => self.sampler = Some(sampler),
            Err(_) => error!("sampler thread panicked"),
        }
        debug!(
            elapsed_us = started.elapsed().as_micros() as u64,
            "workers joined"
        );
        Ok(())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            warn!(error = %err, "controller dropped with unresponsive workers");
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state())
            .field("grid_size", &self.grid_size())
            .field("generation", &self.generation())
            .field("workers", &self.workers.is_some())
            .field("faulted", &self.faulted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use vivarium_test_utils::{CountingGrid, FailingGrid, StallingGrid};

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            grid_size: 16,
            sample_period: Duration::from_millis(1),
            teardown_timeout: Duration::from_millis(500),
            seed: Some(7),
            ..Default::default()
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn construction_generates_and_draws_a_grid() {
        let c = Controller::new(small_config()).unwrap();
        assert_eq!(c.state(), RunState::Stopped);
        assert_eq!(c.grid_size(), Some(16));
        assert_eq!(c.generation(), Generation::ZERO);
        let frame = c.latest_frame().unwrap();
        assert_eq!(frame.size(), 16);
        assert_eq!(frame.generation(), Generation::ZERO);
    }

    #[test]
    fn invalid_config_is_rejected_before_any_grid() {
        let err = Controller::new(PipelineConfig {
            density_percent: 120,
            ..small_config()
        })
        .unwrap_err();
        assert_eq!(
            err,
            ControlError::Config(ConfigError::InvalidDensity { value: 120 })
        );
    }

    #[test]
    fn start_stop_round_trip() {
        let mut c = Controller::new(small_config()).unwrap();
        c.start().unwrap();
        assert!(c.running());
        assert!(c.is_simulating());
        wait_until(|| c.generation() >= Generation(5));
        c.stop().unwrap();
        assert!(!c.running());
        assert!(!c.is_simulating());

        let frozen = c.generation();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(c.generation(), frozen);
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let mut c = Controller::new(small_config()).unwrap();
        let flips = Arc::new(Mutex::new(Vec::new()));
        {
            let flips = Arc::clone(&flips);
            c.on_running_changed(move |r| flips.lock().unwrap().push(r));
        }
        c.start().unwrap();
        c.start().unwrap();
        c.stop().unwrap();
        assert_eq!(*flips.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn start_without_grid_fails() {
        let mut c = Controller::new(small_config()).unwrap();
        c.set_grid(None).unwrap();
        assert!(c.latest_frame().is_none());
        assert_eq!(c.start(), Err(ControlError::NoGrid));
        assert_eq!(c.state(), RunState::Stopped);
    }

    #[test]
    fn set_grid_resets_counters_to_new_baseline() {
        let mut c = Controller::new(small_config()).unwrap();
        c.start().unwrap();
        wait_until(|| c.generation() >= Generation(3));
        c.set_grid(Some(Arc::new(CountingGrid::new(4, 40)))).unwrap();
        assert_eq!(c.state(), RunState::Stopped);
        assert_eq!(c.generation(), Generation(40));
        assert_eq!(c.grid_size(), Some(4));
        assert_eq!(c.latest_frame().unwrap().generation(), Generation(40));
    }

    #[test]
    fn pause_and_resume_restore_running() {
        let mut c = Controller::new(small_config()).unwrap();
        c.start().unwrap();
        c.on_pause().unwrap();
        assert_eq!(c.state(), RunState::PausedRunning);
        assert!(c.running());
        assert!(!c.is_simulating());
        c.on_resume().unwrap();
        assert_eq!(c.state(), RunState::Running);
        assert!(c.is_simulating());
    }

    #[test]
    fn sampler_state_survives_pause() {
        let mut c = Controller::new(small_config()).unwrap();
        c.start().unwrap();
        wait_until(|| c.metrics().frames_rendered >= 3);
        c.on_pause().unwrap();
        let rebuilds = c.metrics().color_rebuilds;
        c.on_resume().unwrap();
        wait_until(|| c.metrics().frames_rendered >= 6);
        c.stop().unwrap();
        assert_eq!(c.metrics().color_rebuilds, rebuilds);
    }

    #[test]
    fn simulator_failure_flips_running_off() {
        let mut c = Controller::new(small_config()).unwrap();
        c.set_grid(Some(Arc::new(FailingGrid::new(4, 3)))).unwrap();
        let failures = Arc::new(Mutex::new(Vec::new()));
        {
            let failures = Arc::clone(&failures);
            c.subscribe(move |e| {
                if let PipelineEvent::SimulatorFailed { reason } = e {
                    failures.lock().unwrap().push(reason.clone());
                }
            });
        }
        c.start().unwrap();
        wait_until(|| !c.running());
        assert_eq!(c.state(), RunState::Stopped);
        assert_eq!(c.metrics().simulator_failures, 1);
        assert_eq!(failures.lock().unwrap().len(), 1);
        assert_eq!(c.generation(), Generation(3));
        // Leftover workers are reaped by the next call.
        c.stop().unwrap();
        assert!(!c.is_simulating());
    }

    #[test]
    fn stalled_teardown_faults_until_new_grid() {
        let mut c = Controller::new(PipelineConfig {
            teardown_timeout: Duration::from_millis(50),
            ..small_config()
        })
        .unwrap();
        let grid = Arc::new(StallingGrid::new(4));
        c.set_grid(Some(Arc::clone(&grid) as Arc<dyn Grid>)).unwrap();
        c.start().unwrap();
        assert!(grid.wait_until_stalled(Duration::from_secs(5)));

        let err = c.stop().unwrap_err();
        assert!(matches!(
            err,
            ControlError::TeardownTimeout {
                component: "simulator",
                ..
            }
        ));
        assert!(c.is_faulted());
        assert!(!c.running());
        assert_eq!(c.start(), Err(ControlError::Faulted));

        grid.release();
        c.reset().unwrap();
        assert!(!c.is_faulted());
        c.start().unwrap();
        c.stop().unwrap();
    }

    #[test]
    fn density_is_validated_and_applied_on_reset() {
        let mut c = Controller::new(small_config()).unwrap();
        assert!(c.set_density(101).is_err());
        c.set_density(0).unwrap();
        c.reset().unwrap();
        assert_eq!(c.population(), 0);
        c.set_density(100).unwrap();
        c.reset().unwrap();
        assert_eq!(c.population(), 16 * 16);
    }

    #[test]
    fn refresh_is_skipped_while_workers_run() {
        let mut c = Controller::new(small_config()).unwrap();
        c.start().unwrap();
        assert_eq!(c.refresh().unwrap(), None);
        c.stop().unwrap();
        assert!(c.refresh().unwrap().is_some());
    }

    #[test]
    fn color_setters_are_sanitized() {
        let c = Controller::new(small_config()).unwrap();
        c.set_color_params(30.0, 2.0, 0.8, -1.0);
        let p = c.color_params();
        assert_eq!(p.hue, 30.0);
        assert_eq!(p.saturation, 1.0);
        assert_eq!(p.old_brightness, 0.0);
    }
}
