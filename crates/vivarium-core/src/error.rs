//! Error types raised by grid collaborators.

use thiserror::Error;

/// Errors from grid construction, stepping, and snapshot copies.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GridError {
    /// Side length was zero, or `size * size` does not fit in memory
    /// addressing.
    #[error("grid size must be positive and addressable, got {size}")]
    InvalidSize {
        /// The rejected side length.
        size: usize,
    },
    /// Density was NaN or outside `[0, 1]`.
    #[error("density must be in [0, 1], got {density}")]
    InvalidDensity {
        /// The rejected density.
        density: f64,
    },
    /// A caller-supplied cell buffer does not match the grid's cell count.
    #[error("cell buffer holds {actual} cells, grid has {expected}")]
    BufferMismatch {
        /// Cells in the grid (`size * size`).
        expected: usize,
        /// Cells in the supplied buffer.
        actual: usize,
    },
    /// A cell age exceeds [`MAX_AGE`](crate::MAX_AGE).
    #[error("cell {index} has age {age}, above the maximum")]
    AgeOutOfRange {
        /// Row-major index of the offending cell.
        index: usize,
        /// The offending age.
        age: u8,
    },
    /// The grid failed to advance one generation.
    #[error("step failed: {reason}")]
    StepFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}
