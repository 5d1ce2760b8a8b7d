//! Running-intent state machine.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// The controller's running intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Not running, and not asked to.
    Stopped,
    /// Asked to run; workers are live.
    Running,
    /// Asked to run, but suspended by the host. Resumes on `on_resume()`.
    PausedRunning,
}

impl RunState {
    /// Whether the user/host wants the simulation active.
    pub fn running_intent(self) -> bool {
        !matches!(self, RunState::Stopped)
    }

    fn to_u8(self) -> u8 {
        match self {
            RunState::Stopped => 0,
            RunState::Running => 1,
            RunState::PausedRunning => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => RunState::Running,
            2 => RunState::PausedRunning,
            _ => RunState::Stopped,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Stopped => "stopped",
            RunState::Running => "running",
            RunState::PausedRunning => "paused-while-running",
        };
        f.write_str(s)
    }
}

/// Atomic [`RunState`] cell.
///
/// The controller drives every transition except one: a failing
/// simulator moves `Running` to `Stopped` from its own thread.
#[derive(Debug)]
pub struct RunStateCell(AtomicU8);

impl Default for RunStateCell {
    fn default() -> Self {
        Self::new(RunState::Stopped)
    }
}

impl RunStateCell {
    /// A cell holding `state`.
    pub fn new(state: RunState) -> Self {
        Self(AtomicU8::new(state.to_u8()))
    }

    /// Current state.
    pub fn load(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store `state`, returning the previous one.
    pub fn swap(&self, state: RunState) -> RunState {
        RunState::from_u8(self.0.swap(state.to_u8(), Ordering::AcqRel))
    }

    /// Move `from` to `to` if the current state is `from`.
    pub fn transition(&self, from: RunState, to: RunState) -> bool {
        self.0
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
