//! The fixed-delay frame sampler.
//!
//! Each invocation reads the published generation and, if it is newer
//! than the last one rendered (or is the never-run marker 0), copies the
//! grid into a private snapshot, recolors it into the back buffer and
//! presents the frame. Older or equal generations are skipped, so
//! rendering is monotonic and tolerates gaps under load.

use std::io;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tracing::{debug, error};
use vivarium_core::{cell_count, CellAge, Generation, Grid, GridError, DEAD};
use vivarium_render::{try_buffer, ColorTable, FrameBuffer, RenderError};

use crate::counters::PublishedCounters;
use crate::events::PipelineEvent;
use crate::metrics::MetricsCounters;
use crate::schedule::{run_fixed_delay, ScheduleToken};
use crate::shared::Shared;
use crate::state::RunState;

/// Result of one [`Sampler::sample`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleOutcome {
    /// No newer generation; the frame was left untouched.
    Skipped,
    /// A frame for this generation was presented.
    Rendered(Generation),
}

/// Read side of one grid: snapshot buffer, color table and frame buffer.
pub struct Sampler {
    grid: Arc<dyn Grid>,
    counters: Arc<PublishedCounters>,
    shared: Arc<Shared>,
    snapshot: Vec<CellAge>,
    frame: FrameBuffer,
    table: ColorTable,
    last_seen: Generation,
}

impl Sampler {
    /// Allocate a sampler sized to `grid`.
    ///
    /// Both the snapshot and the frame buffers are allocated here, so a
    /// failure leaves nothing half-built.
    pub fn new(
        grid: Arc<dyn Grid>,
        counters: Arc<PublishedCounters>,
        shared: Arc<Shared>,
    ) -> Result<Self, RenderError> {
        let size = grid.size();
        let count = cell_count(size).map_err(|_| RenderError::InvalidSize { size })?;
        let snapshot = try_buffer(count, DEAD, "cell snapshot")?;
        let frame = FrameBuffer::new(size, Arc::clone(&shared.frames))?;
        Ok(Self {
            grid,
            counters,
            shared,
            snapshot,
            frame,
            table: ColorTable::new(),
            last_seen: Generation::ZERO,
        })
    }

    /// Last generation rendered.
    pub fn last_seen(&self) -> Generation {
        self.last_seen
    }

    /// The color table used for the most recent frame.
    pub fn table(&self) -> &ColorTable {
        &self.table
    }

    /// Sample once.
    pub fn sample(&mut self) -> Result<SampleOutcome, GridError> {
        let generation = self.counters.generation();
        if !generation.is_zero() && generation <= self.last_seen {
            MetricsCounters::bump(&self.shared.metrics.samples_skipped);
            return Ok(SampleOutcome::Skipped);
        }
        let started = Instant::now();
        let population = self.counters.population();

        // Copy first: a failed copy leaves the table, the color flag and
        // the presented frame untouched.
        self.grid.copy_cells(&mut self.snapshot)?;

        let changed = self.shared.colors.take_if_changed();
        if changed.is_some() || !self.table.is_valid() {
            let params = changed.unwrap_or_else(|| self.shared.colors.params());
            self.table.rebuild(params);
            MetricsCounters::bump(&self.shared.metrics.color_rebuilds);
            debug!(params = ?self.table.params(), "color table rebuilt");
        }

        self.recolor();
        self.frame.present(generation);
        self.last_seen = generation;

        let metrics = &self.shared.metrics;
        metrics
            .last_sample_us
            .store(started.elapsed().as_micros() as u64, Ordering::Relaxed);
        MetricsCounters::bump(&metrics.frames_rendered);

        self.shared.emit(PipelineEvent::FramePublished {
            generation,
            population,
        });
        if generation.is_zero() {
            self.shared.emit(PipelineEvent::RepaintRequested);
        }
        Ok(SampleOutcome::Rendered(generation))
    }

    fn recolor(&mut self) {
        let size = self.frame.size();
        for (y, row) in self.snapshot.chunks_exact(size).enumerate() {
            for (x, &age) in row.iter().enumerate() {
                self.frame.set_pixel(x, y, self.table.color_for(age));
            }
        }
    }

    /// Run on a dedicated thread, sampling every `period` (fixed delay)
    /// until `cancel` disconnects or `token` is revoked.
    ///
    /// Once `simulator_stopped` is observed the next firing renders the
    /// final state and exits. A failed sample clears `run_flag`, so the
    /// simulator follows the sampler out. The sampler is returned on exit.
    pub(crate) fn spawn(
        mut self,
        period: Duration,
        cancel: Receiver<()>,
        token: ScheduleToken,
        run_flag: Arc<AtomicBool>,
        simulator_stopped: Arc<AtomicBool>,
    ) -> io::Result<JoinHandle<Sampler>> {
        thread::Builder::new()
            .name("vivarium-sampler".into())
            .spawn(move || {
                debug!(period_ms = period.as_millis() as u64, "sampler started");
                let firings = run_fixed_delay(period, &cancel, &token, || {
                    let finished = simulator_stopped.load(Ordering::Acquire);
                    if let Err(err) = self.sample() {
                        run_flag.store(false, Ordering::Release);
                        self.report_failure(&err);
                        return ControlFlow::Break(());
                    }
                    if finished {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                });
                debug!(firings, last_seen = %self.last_seen, "sampler exited");
                self
            })
    }

    fn report_failure(&self, err: &GridError) {
        error!(
            error = %err,
            last_seen = %self.last_seen,
            "sampler terminated"
        );
        MetricsCounters::bump(&self.shared.metrics.sampler_failures);
        if self
            .shared
            .state
            .transition(RunState::Running, RunState::Stopped)
        {
            self.shared.emit(PipelineEvent::RunningChanged(false));
        }
        self.shared.emit(PipelineEvent::SamplerFailed {
            reason: err.to_string(),
        });
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("size", &self.frame.size())
            .field("last_seen", &self.last_seen)
            .field("table_valid", &self.table.is_valid())
            .finish()
    }
}
