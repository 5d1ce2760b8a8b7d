//! Strongly-typed generation counter.

use std::fmt;

/// Monotonically non-decreasing simulation step counter.
///
/// Incremented by exactly one each time a grid advances. `Generation(0)`
/// doubles as the "never iterated" marker consumed by the sampler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    /// The baseline generation of a freshly constructed grid.
    pub const ZERO: Generation = Generation(0);

    /// Whether this is the never-iterated marker.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The generation after this one.
    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Generation {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
