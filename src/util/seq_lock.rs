//! Tear-free 64-bit cells for targets without 64-bit atomics.
//!
//! The Cortex-M4 can load and store 32-bit words atomically but offers
//! nothing wider, and both the system clock and the carrier-sense timestamp
//! are 64-bit microsecond counts shared between ISRs and the foreground
//! loop. `SeqLock` splits the value across two 32-bit atomics and brackets
//! each store with a sequence counter, so a reader that observes a torn pair
//! also observes the counter mid-change and retries.
//!
//! This is a single-writer structure: all stores to a given cell must come
//! from one execution context (in practice, one ISR). Readers may run
//! anywhere, any time, and never block the writer.

use core::sync::atomic::{AtomicU32, Ordering};

/// A 64-bit value readable without tearing from any context.
#[derive(Debug)]
pub struct SeqLock {
    seq: AtomicU32,
    lo: AtomicU32,
    hi: AtomicU32,
}

impl SeqLock {
    pub const fn new(value: u64) -> Self {
        SeqLock {
            seq: AtomicU32::new(0),
            lo: AtomicU32::new(value as u32),
            hi: AtomicU32::new((value >> 32) as u32),
        }
    }

    /// Stores a new value. Must only be called from the cell's single writer
    /// context; two racing writers would corrupt the sequence protocol.
    pub fn store(&self, value: u64) {
        let s = self.seq.load(Ordering::Relaxed);
        // Odd sequence = store in progress. Release on the final bump
        // publishes both halves.
        self.seq.store(s.wrapping_add(1), Ordering::Release);
        self.lo.store(value as u32, Ordering::Relaxed);
        self.hi.store((value >> 32) as u32, Ordering::Relaxed);
        self.seq.store(s.wrapping_add(2), Ordering::Release);
    }

    /// Loads the value, retrying if a store is observed in flight. The
    /// writer makes progress in a handful of instructions, so the retry loop
    /// is short even when it triggers at all.
    pub fn load(&self) -> u64 {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 != 0 {
                continue;
            }
            let lo = self.lo.load(Ordering::Acquire);
            let hi = self.hi.load(Ordering::Acquire);
            if self.seq.load(Ordering::Acquire) == before {
                return (hi as u64) << 32 | lo as u64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_load() {
        let c = SeqLock::new(0);
        assert_eq!(c.load(), 0);
        c.store(0x1234_5678_9abc_def0);
        assert_eq!(c.load(), 0x1234_5678_9abc_def0);
        c.store(u64::MAX);
        assert_eq!(c.load(), u64::MAX);
    }

    #[test]
    fn initial_value() {
        assert_eq!(SeqLock::new(57).load(), 57);
    }
}
