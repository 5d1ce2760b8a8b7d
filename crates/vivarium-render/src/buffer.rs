//! Fallible buffer allocation.

use crate::error::RenderError;

/// Allocate a `len`-element buffer filled with `value`, reporting
/// allocator failure instead of aborting.
pub fn try_buffer<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>, RenderError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| RenderError::AllocationFailed {
            what,
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buf.resize(len, value);
    Ok(buf)
}
