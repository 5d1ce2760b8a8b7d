//! Color parameters shared between the host and the sampler.
//!
//! Setters run on the host thread and only flag the change; the sampler
//! picks it up with [`ColorSettings::take_if_changed`] at the start of
//! its next invocation and rebuilds its private table once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::warn;
use vivarium_render::ColorParams;

/// Current color parameters plus a "changed since last sample" flag.
#[derive(Debug)]
pub struct ColorSettings {
    params: Mutex<ColorParams>,
    changed: AtomicBool,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self::new(ColorParams::default())
    }
}

impl ColorSettings {
    /// Settings starting from `params` (sanitized).
    pub fn new(params: ColorParams) -> Self {
        Self {
            params: Mutex::new(params.sanitized().0),
            changed: AtomicBool::new(true),
        }
    }

    /// Snapshot of the current parameters.
    pub fn params(&self) -> ColorParams {
        *self.params.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the hue in degrees.
    pub fn set_hue(&self, hue: f32) {
        self.update(|p| p.hue = hue);
    }

    /// Set the saturation.
    pub fn set_saturation(&self, saturation: f32) {
        self.update(|p| p.saturation = saturation);
    }

    /// Set the brightness of newborn cells.
    pub fn set_new_brightness(&self, brightness: f32) {
        self.update(|p| p.new_brightness = brightness);
    }

    /// Set the brightness approached by the oldest cells.
    pub fn set_old_brightness(&self, brightness: f32) {
        self.update(|p| p.old_brightness = brightness);
    }

    /// Replace all four parameters at once.
    pub fn set_params(&self, params: ColorParams) {
        self.update(|p| *p = params);
    }

    /// Clear the changed flag, returning the parameters it covered.
    ///
    /// The flag and the parameters are read under one lock, so a setter
    /// racing with this call is either included or left flagged.
    pub fn take_if_changed(&self) -> Option<ColorParams> {
        let guard = self.params.lock().unwrap_or_else(PoisonError::into_inner);
        self.changed
            .swap(false, Ordering::AcqRel)
            .then_some(*guard)
    }

    fn update(&self, apply: impl FnOnce(&mut ColorParams)) {
        let mut guard = self.params.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = *guard;
        apply(&mut next);
        debug_assert!(next.is_finite(), "non-finite color params: {next:?}");
        let (clean, adjusted) = next.sanitized();
        if adjusted {
            warn!(requested = ?next, applied = ?clean, "color parameters clamped");
        }
        *guard = clean;
        self.changed.store(true, Ordering::Release);
    }
}
