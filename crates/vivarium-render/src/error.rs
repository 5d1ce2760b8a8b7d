//! Render-side errors.

use thiserror::Error;

/// Errors from sizing or allocating render buffers.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A buffer could not be allocated at the requested size.
    #[error("failed to allocate {what}: {bytes} bytes")]
    AllocationFailed {
        /// Which buffer was being allocated.
        what: &'static str,
        /// Requested size in bytes (saturated on overflow).
        bytes: usize,
    },
    /// Side length was zero or its square overflowed.
    #[error("frame size must be positive and addressable, got {size}")]
    InvalidSize {
        /// The rejected side length.
        size: usize,
    },
}
