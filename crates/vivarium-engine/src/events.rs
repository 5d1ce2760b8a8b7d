//! Notifications from the pipeline to the host.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use vivarium_core::Generation;

/// Something the host may want to react to.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    /// The sampler presented a new frame.
    FramePublished {
        /// Generation the frame was sampled at.
        generation: Generation,
        /// Population published alongside that generation.
        population: usize,
    },
    /// A never-iterated grid was drawn; the host should repaint even
    /// though the generation counter has not moved.
    RepaintRequested,
    /// The running intent changed.
    RunningChanged(bool),
    /// The simulator terminated with an error.
    SimulatorFailed {
        /// Human-readable cause.
        reason: String,
    },
    /// The sampler could not read the grid and stopped the pipeline.
    SamplerFailed {
        /// Human-readable cause.
        reason: String,
    },
}

/// A registered callback.
///
/// Listeners run on whichever thread raised the event (sampler,
/// simulator, or the caller of a controller method), never under an
/// internal lock.
pub type Listener = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Registry of listeners.
#[derive(Default)]
pub struct Listeners {
    inner: Mutex<Vec<Listener>>,
}

impl Listeners {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every subsequent event.
    pub fn subscribe(&self, listener: Listener) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Deliver `event` to every listener.
    pub fn emit(&self, event: &PipelineEvent) {
        let listeners = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}
