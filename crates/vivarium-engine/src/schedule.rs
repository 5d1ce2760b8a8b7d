//! Single-slot fixed-delay scheduling.
//!
//! The sampler waits `period` on a cancel channel, runs its body to
//! completion, then waits again. The next firing is measured from the end
//! of the previous one, so firings never overlap and a slow body pushes
//! later firings back instead of queueing them.
//!
//! Each launch is issued a [`ScheduleToken`]. Revoking the schedule makes
//! every outstanding token inactive, and a firing whose token is no
//! longer active exits instead of touching torn-down state.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

/// Issues and revokes the "currently active schedule" identity.
#[derive(Debug, Default)]
pub struct Schedule {
    active: Arc<AtomicU64>,
}

impl Schedule {
    /// A schedule with no active token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke any previous token and issue a new active one.
    pub fn issue(&self) -> ScheduleToken {
        let id = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        ScheduleToken {
            id,
            active: Arc::clone(&self.active),
        }
    }

    /// Make every outstanding token inactive.
    pub fn revoke(&self) {
        self.active.fetch_add(1, Ordering::AcqRel);
    }
}

/// Proof that a scheduled task belongs to the current launch.
#[derive(Debug)]
pub struct ScheduleToken {
    id: u64,
    active: Arc<AtomicU64>,
}

impl ScheduleToken {
    /// Whether this token's launch is still the active one.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) == self.id
    }
}

/// Run `body` every `period` (fixed delay) until cancelled.
///
/// Cancellation is a message on `cancel`, the sender being dropped, the
/// token being revoked, or `body` returning [`ControlFlow::Break`].
/// Returns the number of firings that ran `body`.
pub fn run_fixed_delay<F>(
    period: Duration,
    cancel: &Receiver<()>,
    token: &ScheduleToken,
    mut body: F,
) -> u64
where
    F: FnMut() -> ControlFlow<()>,
{
    let mut firings = 0;
    loop {
        match cancel.recv_timeout(period) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        if !token.is_active() {
            break;
        }
        firings += 1;
        if body().is_break() {
            break;
        }
    }
    firings
}
