//! The grid collaborator consumed by the simulation pipeline.
//!
//! The pipeline never looks inside a grid's update rule or storage. It
//! only drives [`Grid::iterate`] from one thread while copying cells out
//! with [`Grid::copy_cells`] from another, so both operations take
//! `&self` and every implementation must be `Send + Sync`.

use std::sync::Arc;

use crate::cell::CellAge;
use crate::error::GridError;
use crate::id::Generation;

/// A square matrix of cell ages that advances one generation at a time.
///
/// # Concurrency contract
///
/// * At most one thread calls [`iterate`](Grid::iterate) at a time.
///   Implementations must stay memory-safe if that is violated, but the
///   resulting generations are unspecified.
/// * [`copy_cells`](Grid::copy_cells) may run concurrently with
///   `iterate`. A copy may observe a mix of pre- and post-step values for
///   the step in flight, but each individual cell is read whole.
/// * After `iterate` returns, [`generation`](Grid::generation) and
///   [`population`](Grid::population) describe the step just completed.
pub trait Grid: Send + Sync + 'static {
    /// Side length of the square grid.
    fn size(&self) -> usize;

    /// Generations advanced since construction, from the grid's baseline.
    fn generation(&self) -> Generation;

    /// Number of live cells after the most recent step.
    fn population(&self) -> usize;

    /// Advance one generation in place.
    fn iterate(&self) -> Result<(), GridError>;

    /// Copy every cell age into `dest` in row-major order.
    ///
    /// `dest` must hold exactly `size * size` cells.
    fn copy_cells(&self, dest: &mut [CellAge]) -> Result<(), GridError>;
}

/// Builds fresh grids for the controller's `reset()`.
pub trait GridFactory: Send + Sync {
    /// Create a grid of side `size` where each cell starts alive with
    /// probability `density`, drawing randomness from `seed`.
    fn create(&self, size: usize, density: f64, seed: u64) -> Result<Arc<dyn Grid>, GridError>;
}

/// Number of cells in a grid of side `size`, rejecting zero and overflow.
pub fn cell_count(size: usize) -> Result<usize, GridError> {
    if size == 0 {
        return Err(GridError::InvalidSize { size });
    }
    size.checked_mul(size)
        .filter(|&n| n <= isize::MAX as usize)
        .ok_or(GridError::InvalidSize { size })
}
