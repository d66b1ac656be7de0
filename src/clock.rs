//! The free-running system clock.
//!
//! One hardware timer fires every [`timing::TICK_MICROS`] microseconds and
//! bumps a 64-bit counter; everything else in the receiver measures time by
//! snapshotting that counter. The tick quantum bounds the read error at one
//! tick, which is comfortably inside every interval the state machine cares
//! about (the narrowest decision window is a quarter chip period, two orders
//! of magnitude wider).
//!
//! [`timing::TICK_MICROS`]: ../timing/constant.TICK_MICROS.html

use crate::util::seq_lock::SeqLock;

/// Microsecond count as kept by [`SysClock`]. Monotonic; never wraps within
/// the life of the hardware.
pub type Micros = u64;

/// The counter itself. Ticked from exactly one timer ISR, read from
/// anywhere.
#[derive(Debug)]
pub struct SysClock {
    micros: SeqLock,
}

impl SysClock {
    pub const fn new() -> Self {
        SysClock {
            micros: SeqLock::new(0),
        }
    }

    /// Advances the clock by one tick quantum. Tick-ISR context only.
    pub fn tick(&self, quantum: Micros) {
        self.micros.store(self.micros.load() + quantum);
    }

    /// Snapshot of the current time.
    pub fn now(&self) -> Micros {
        self.micros.load()
    }
}
