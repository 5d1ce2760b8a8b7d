//! Test grids for Vivarium development.
//!
//! Three [`Grid`] implementations with scripted behaviour, for driving
//! the pipeline without depending on Life dynamics:
//!
//! - [`CountingGrid`]: every cell's age equals the generation (capped).
//! - [`FailingGrid`]: fails deterministically after N steps.
//! - [`CopyFailingGrid`]: steps forever but fails to copy after N reads.
//! - [`StallingGrid`]: blocks inside `iterate` until released.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use vivarium_core::{cell_count, CellAge, Generation, Grid, GridError, MAX_AGE};

fn check_dest(size: usize, dest: &[CellAge]) -> Result<usize, GridError> {
    let expected = cell_count(size)?;
    if dest.len() != expected {
        return Err(GridError::BufferMismatch {
            expected,
            actual: dest.len(),
        });
    }
    Ok(expected)
}

// ── CountingGrid ───────────────────────────────────────────────────

/// Uniform grid whose cells all have age `min(generation, MAX_AGE)`.
///
/// At generation 0 every cell is dead; afterwards every cell is alive.
/// Rendering it yields a single flat color that identifies the
/// generation, which makes frame/generation mismatches easy to spot.
pub struct CountingGrid {
    size: usize,
    generation: AtomicU64,
}

impl CountingGrid {
    pub fn new(size: usize, baseline: u64) -> Self {
        Self {
            size,
            generation: AtomicU64::new(baseline),
        }
    }

    /// The age every cell has at `generation`.
    pub fn age_at(generation: Generation) -> CellAge {
        generation.0.min(u64::from(MAX_AGE)) as CellAge
    }
}

impl Grid for CountingGrid {
    fn size(&self) -> usize {
        self.size
    }

    fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    fn population(&self) -> usize {
        if self.generation().is_zero() {
            0
        } else {
            self.size * self.size
        }
    }

    fn iterate(&self) -> Result<(), GridError> {
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn copy_cells(&self, dest: &mut [CellAge]) -> Result<(), GridError> {
        check_dest(self.size, dest)?;
        dest.fill(Self::age_at(self.generation()));
        Ok(())
    }
}

// ── FailingGrid ────────────────────────────────────────────────────

/// All-dead grid that succeeds `succeed_steps` times, then fails every
/// subsequent `iterate`.
pub struct FailingGrid {
    size: usize,
    succeed_steps: u64,
    generation: AtomicU64,
}

impl FailingGrid {
    pub fn new(size: usize, succeed_steps: u64) -> Self {
        Self {
            size,
            succeed_steps,
            generation: AtomicU64::new(0),
        }
    }
}

impl Grid for FailingGrid {
    fn size(&self) -> usize {
        self.size
    }

    fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    fn population(&self) -> usize {
        0
    }

    fn iterate(&self) -> Result<(), GridError> {
        let current = self.generation.load(Ordering::Acquire);
        if current >= self.succeed_steps {
            return Err(GridError::StepFailed {
                reason: format!("injected failure at generation {current}"),
            });
        }
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn copy_cells(&self, dest: &mut [CellAge]) -> Result<(), GridError> {
        check_dest(self.size, dest)?;
        dest.fill(0);
        Ok(())
    }
}

// ── CopyFailingGrid ────────────────────────────────────────────────

/// All-dead grid whose steps always succeed but whose `copy_cells`
/// succeeds `succeed_copies` times, then fails every later call.
pub struct CopyFailingGrid {
    size: usize,
    succeed_copies: u64,
    copies: AtomicU64,
    generation: AtomicU64,
}

impl CopyFailingGrid {
    pub fn new(size: usize, succeed_copies: u64) -> Self {
        Self {
            size,
            succeed_copies,
            copies: AtomicU64::new(0),
            generation: AtomicU64::new(0),
        }
    }

    /// Number of `copy_cells` calls so far, failed ones included.
    pub fn copies(&self) -> u64 {
        self.copies.load(Ordering::Acquire)
    }
}

impl Grid for CopyFailingGrid {
    fn size(&self) -> usize {
        self.size
    }

    fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    fn population(&self) -> usize {
        0
    }

    fn iterate(&self) -> Result<(), GridError> {
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn copy_cells(&self, dest: &mut [CellAge]) -> Result<(), GridError> {
        check_dest(self.size, dest)?;
        let done = self.copies.fetch_add(1, Ordering::AcqRel);
        if done >= self.succeed_copies {
            return Err(GridError::StepFailed {
                reason: format!("injected copy failure after {done} copies"),
            });
        }
        dest.fill(0);
        Ok(())
    }
}

// ── StallingGrid ───────────────────────────────────────────────────

#[derive(Default)]
struct Gate {
    released: bool,
    stalled: bool,
}

/// All-dead grid whose `iterate` blocks until [`release`](Self::release)
/// is called. Once released, every later step passes straight through.
///
/// `copy_cells` never blocks.
pub struct StallingGrid {
    size: usize,
    generation: AtomicU64,
    gate: Mutex<Gate>,
    signal: Condvar,
}

impl StallingGrid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            generation: AtomicU64::new(0),
            gate: Mutex::new(Gate::default()),
            signal: Condvar::new(),
        }
    }

    /// Block until some thread is parked in `iterate`. Returns `false`
    /// on timeout.
    pub fn wait_until_stalled(&self, timeout: Duration) -> bool {
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let (gate, _) = self
            .signal
            .wait_timeout_while(gate, timeout, |g| !g.stalled)
            .unwrap_or_else(PoisonError::into_inner);
        gate.stalled
    }

    /// Let every current and future `iterate` proceed.
    pub fn release(&self) {
        let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        gate.released = true;
        self.signal.notify_all();
    }
}

impl Grid for StallingGrid {
    fn size(&self) -> usize {
        self.size
    }

    fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    fn population(&self) -> usize {
        0
    }

    fn iterate(&self) -> Result<(), GridError> {
        let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if !gate.released {
            gate.stalled = true;
            self.signal.notify_all();
            gate = self
                .signal
                .wait_while(gate, |g| !g.released)
                .unwrap_or_else(PoisonError::into_inner);
            gate.stalled = false;
        }
        drop(gate);
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn copy_cells(&self, dest: &mut [CellAge]) -> Result<(), GridError> {
        check_dest(self.size, dest)?;
        dest.fill(0);
        Ok(())
    }
}
