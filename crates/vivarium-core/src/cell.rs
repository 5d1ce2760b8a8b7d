//! Cell age representation.

/// Age of a single cell in consecutive generations alive.
///
/// `0` is dead; `1..=MAX_AGE` is alive. Ages saturate at [`MAX_AGE`].
pub type CellAge = u8;

/// The dead cell value.
pub const DEAD: CellAge = 0;

/// Maximum tracked age. Cells alive longer than this stay at `MAX_AGE`.
pub const MAX_AGE: CellAge = 127;
