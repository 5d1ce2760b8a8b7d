//! Pipeline configuration, validation, and error types.
//!
//! [`PipelineConfig`] is the constructor input for a
//! [`Controller`](crate::Controller). [`validate()`](PipelineConfig::validate)
//! checks every knob before any grid is built or thread spawned.

use std::time::Duration;

use thiserror::Error;
use vivarium_render::ColorParams;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`PipelineConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Grid side length is zero or its square overflows.
    #[error("grid_size must be positive and addressable, got {value}")]
    InvalidGridSize {
        /// The rejected size.
        value: usize,
    },
    /// Density percentage above 100.
    #[error("density_percent must be at most 100, got {value}")]
    InvalidDensity {
        /// The rejected percentage.
        value: u8,
    },
    /// Sample period is zero.
    #[error("sample_period must be positive")]
    ZeroSamplePeriod,
    /// Teardown timeout is zero.
    #[error("teardown_timeout must be positive")]
    ZeroTeardownTimeout,
    /// A color parameter is NaN or infinite.
    #[error("color parameters must be finite, got {params:?}")]
    NonFiniteColors {
        /// The rejected parameters.
        params: ColorParams,
    },
}

// ── PipelineConfig ─────────────────────────────────────────────────

/// Configuration for the simulate/render pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Side length of generated grids. Default: 500.
    pub grid_size: usize,
    /// Percentage of cells alive in a freshly generated grid. Default: 20.
    pub density_percent: u8,
    /// Delay between the end of one sample and the start of the next.
    /// Default: 10 ms.
    pub sample_period: Duration,
    /// How long teardown waits for workers before declaring a fault.
    /// Default: 2 s.
    pub teardown_timeout: Duration,
    /// Initial age-to-color parameters.
    pub colors: ColorParams,
    /// Seed for grid generation. `None` draws one from system entropy.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid_size: 500,
            density_percent: 20,
            sample_period: Duration::from_millis(10),
            teardown_timeout: Duration::from_secs(2),
            colors: ColorParams::default(),
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Upper bound of `density_percent`.
    pub const MAX_DENSITY_PERCENT: u8 = 100;

    /// Validate all knobs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if vivarium_core::cell_count(self.grid_size).is_err() {
            return Err(ConfigError::InvalidGridSize {
                value: self.grid_size,
            });
        }
        validate_density(self.density_percent)?;
        if self.sample_period.is_zero() {
            return Err(ConfigError::ZeroSamplePeriod);
        }
        if self.teardown_timeout.is_zero() {
            return Err(ConfigError::ZeroTeardownTimeout);
        }
        if !self.colors.is_finite() {
            return Err(ConfigError::NonFiniteColors {
                params: self.colors,
            });
        }
        Ok(())
    }

    /// Density as a probability in `[0, 1]`.
    pub fn density(&self) -> f64 {
        density_fraction(self.density_percent)
    }
}

/// Reject percentages above 100.
pub(crate) fn validate_density(percent: u8) -> Result<(), ConfigError> {
    if percent > PipelineConfig::MAX_DENSITY_PERCENT {
        return Err(ConfigError::InvalidDensity { value: percent });
    }
    Ok(())
}

/// Convert a density percentage to a probability.
pub(crate) fn density_fraction(percent: u8) -> f64 {
    f64::from(percent) / 100.0
}
