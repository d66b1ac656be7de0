//! State identifiers and the shared current-state word.

use core::sync::atomic::{AtomicU8, Ordering};

/// The receiver's operating states.
///
/// Transitions are requested by storing into a [`StateRegister`], possibly
/// from interrupt context; the foreground dispatcher notices the change on
/// its next iteration and runs the exit/init handshake.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum StateId {
    /// Terminal diagnostic state: dumps its inbound context and parks.
    DoNothing = 0,
    /// Idle, watching for the first carrier edges of a preamble.
    Waiting = 1,
    /// Collecting carrier edges to measure the chip period.
    Syncing = 2,
    /// Tracking the preamble, waiting for it to end.
    Synced = 3,
    /// Sampling chips and estimating per-layer amplitude from the training
    /// pattern.
    Leveling = 4,
    /// Sampling chips and streaming decoded bytes.
    Receiving = 5,
}

impl StateId {
    fn from_u8(v: u8) -> StateId {
        match v {
            1 => StateId::Waiting,
            2 => StateId::Syncing,
            3 => StateId::Synced,
            4 => StateId::Leveling,
            5 => StateId::Receiving,
            _ => StateId::DoNothing,
        }
    }
}

/// A current-state word shared between ISRs and the foreground loop.
///
/// Stores are single-word and unordered with respect to anything else: the
/// only parties that request transitions are the states themselves, and a
/// later request legitimately overrides an earlier one.
#[derive(Debug)]
pub struct StateRegister {
    value: AtomicU8,
}

impl StateRegister {
    pub const fn new(initial: StateId) -> Self {
        StateRegister {
            value: AtomicU8::new(initial as u8),
        }
    }

    pub fn get(&self) -> StateId {
        StateId::from_u8(self.value.load(Ordering::Relaxed))
    }

    pub fn set(&self, state: StateId) {
        self.value.store(state as u8, Ordering::Relaxed);
    }
}
