//! Run lifecycle state machine.
//!
//! Every run walks `Idle → ResourcesAcquired → SessionResolved → Executing →
//! {Streaming | SingleShot} → Finalizing → Done`, with `Error` absorbing
//! failures from the executing states. `Finalizing` is reachable from every
//! phase so partial-failure paths (acquisition, session resolution) can
//! still release what they acquired.

use tracing::debug;
use uuid::Uuid;

/// Phase of a run's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Run created, nothing acquired yet.
    Idle,
    /// Tool-server connections established.
    ResourcesAcquired,
    /// Persistence session resolved (possibly memory-less).
    SessionResolved,
    /// Executor invocation about to start.
    Executing,
    /// Streamed execution in flight.
    Streaming,
    /// Single-shot execution in flight.
    SingleShot,
    /// Executor failed; finalization pending.
    Error,
    /// Releasing resources (shell → session → connections).
    Finalizing,
    /// Run complete; all resources released.
    Done,
}

impl RunPhase {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(self, next: RunPhase) -> bool {
        use RunPhase::{
            Done, Error, Executing, Finalizing, Idle, ResourcesAcquired, SessionResolved,
            SingleShot, Streaming,
        };
        match next {
            // Finalization is entered from every state except itself/Done.
            Finalizing => !matches!(self, Finalizing | Done),
            ResourcesAcquired => self == Idle,
            SessionResolved => self == ResourcesAcquired,
            Executing => self == SessionResolved,
            Streaming | SingleShot => self == Executing,
            Error => matches!(self, Executing | Streaming | SingleShot),
            Done => self == Finalizing,
            Idle => false,
        }
    }
}

/// Tracks and validates one run's phase transitions.
pub struct RunState {
    run_id: String,
    phase: RunPhase,
}

impl RunState {
    /// New run in `Idle` with a fresh run id.
    pub fn new() -> Self {
        Self {
            run_id: format!("run_{}", Uuid::now_v7()),
            phase: RunPhase::Idle,
        }
    }

    /// The run id.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Advance to `next`, tracing the transition.
    ///
    /// An illegal transition is a programming error; debug builds panic.
    pub fn advance(&mut self, next: RunPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "invalid phase transition {:?} -> {next:?}",
            self.phase
        );
        debug!(run_id = %self.run_id, from = ?self.phase, to = ?next, "run phase");
        self.phase = next;
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
