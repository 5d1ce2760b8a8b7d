//! State shared by the controller and both workers.

use std::sync::Arc;

use vivarium_render::{ColorParams, FrameSlot};

use crate::events::{Listeners, PipelineEvent};
use crate::metrics::MetricsCounters;
use crate::settings::ColorSettings;
use crate::state::{RunState, RunStateCell};

/// Long-lived state that outlives individual grids and worker threads.
#[derive(Debug)]
pub struct Shared {
    /// Running intent.
    pub state: RunStateCell,
    /// Host callbacks.
    pub listeners: Listeners,
    /// Throughput counters.
    pub metrics: MetricsCounters,
    /// Color parameters.
    pub colors: ColorSettings,
    /// Presented frame hand-off.
    pub frames: Arc<FrameSlot>,
}

// Compile-time assertion: Shared must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Shared>();
};

impl Shared {
    /// Fresh shared state with `colors` as the initial parameters.
    pub fn new(colors: ColorParams) -> Self {
        Self {
            state: RunStateCell::new(RunState::Stopped),
            listeners: Listeners::new(),
            metrics: MetricsCounters::new(),
            colors: ColorSettings::new(colors),
            frames: Arc::new(FrameSlot::new()),
        }
    }

    /// Emit `event` to every listener.
    pub fn emit(&self, event: PipelineEvent) {
        self.listeners.emit(&event);
    }
}
