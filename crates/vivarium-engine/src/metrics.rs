//! Pipeline throughput metrics.
//!
//! Workers bump [`MetricsCounters`] with relaxed atomics; hosts read a
//! [`PipelineMetrics`] snapshot through
//! [`Controller::metrics()`](crate::Controller::metrics).

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the pipeline counters.
///
/// Counters are cumulative over the controller's lifetime and survive
/// pause, stop and reset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineMetrics {
    /// Completed simulator steps.
    pub iterations: u64,
    /// Frames presented by the sampler.
    pub frames_rendered: u64,
    /// Sampler invocations skipped because no newer generation existed.
    pub samples_skipped: u64,
    /// Color table rebuilds.
    pub color_rebuilds: u64,
    /// Duration of the most recent rendered sample, in microseconds.
    pub last_sample_us: u64,
    /// Simulator terminations caused by a grid error.
    pub simulator_failures: u64,
    /// Sampler terminations caused by a failed grid copy.
    pub sampler_failures: u64,
}

/// Live atomic counters behind [`PipelineMetrics`].
#[derive(Debug, Default)]
pub struct MetricsCounters {
    pub(crate) iterations: AtomicU64,
    pub(crate) frames_rendered: AtomicU64,
    pub(crate) samples_skipped: AtomicU64,
    pub(crate) color_rebuilds: AtomicU64,
    pub(crate) last_sample_us: AtomicU64,
    pub(crate) simulator_failures: AtomicU64,
    pub(crate) sampler_failures: AtomicU64,
}

impl MetricsCounters {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    pub fn snapshot(&self) -> PipelineMetrics {
        PipelineMetrics {
            iterations: self.iterations.load(Ordering::Relaxed),
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            samples_skipped: self.samples_skipped.load(Ordering::Relaxed),
            color_rebuilds: self.color_rebuilds.load(Ordering::Relaxed),
            last_sample_us: self.last_sample_us.load(Ordering::Relaxed),
            simulator_failures: self.simulator_failures.load(Ordering::Relaxed),
            sampler_failures: self.sampler_failures.load(Ordering::Relaxed),
        }
    }
}
