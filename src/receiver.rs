//! The receiver singleton and its foreground dispatcher.
//!
//! Everything the ISRs touch lives in [`Receiver`]: lock-free cells sized so
//! that each one has a single writing context. The firmware instantiates one
//! `Receiver` as a `static` and points its interrupt trampolines at it; the
//! test harness builds one on the stack next to a simulated board.
//!
//! Foreground-only bookkeeping — the amplitude estimators, the level-check
//! window, the half-assembled byte, the previous-state latch — lives in
//! [`Demod`], which the main loop owns outright.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::debug;

use crate::board::Board;
use crate::clock::Micros;
use crate::context::Context;
use crate::state::{StateId, StateRegister};
use crate::states::{do_nothing, leveling, receiving, sampler, synced, syncing, waiting};
use crate::timing;
use crate::util::isr_buf::IsrBuf;
use crate::util::seq_lock::SeqLock;

/// ISR-shared receiver state.
pub struct Receiver {
    /// The state the receiver wants to be in. Written by states from any
    /// context; read by the dispatcher.
    pub(crate) state: StateRegister,
    /// The state whose handlers currently own the interrupt sources. Only
    /// the dispatcher writes this, between the old state's exit and the new
    /// state's init, while both sources are disarmed.
    handlers: StateRegister,
    /// Chip (or timeout) period of the active state, in µs. Written during
    /// init only; chip periods fit comfortably in 32 bits of microseconds.
    period: AtomicU32,
    /// Most recent carrier-sense edge. Written by the carrier ISR (and
    /// seeded from init while the carrier ISR is disarmed).
    pub(crate) last_cs: SeqLock,
    /// Waiting: timestamp of the lone first edge, [`waiting::UNSET`] when
    /// forgotten. Written by the carrier and noise-timer ISRs, which share a
    /// priority and therefore never interleave.
    pub(crate) first_cs: SeqLock,
    /// Waiting: timestamp of the second edge, which rides into Syncing as
    /// the end of the first measured period.
    pub(crate) exit_cs: SeqLock,
    /// Syncing: carrier-edge timestamps for the period average.
    pub(crate) stamps: IsrBuf<Micros, { timing::SYNC_STAMPS }>,
    /// Leveling/Receiving: the frame being filled by the chip-sample ISR.
    pub(crate) frame: IsrBuf<i32, { sic::FRAME_CHIPS }>,
    /// Set while the chip timer is running one phase-shifted interval; the
    /// next expiry restores the normal cadence before taking its sample.
    pub(crate) restore: AtomicBool,
}

impl Receiver {
    pub const fn new() -> Self {
        Receiver {
            state: StateRegister::new(StateId::DoNothing),
            handlers: StateRegister::new(StateId::DoNothing),
            period: AtomicU32::new(0),
            last_cs: SeqLock::new(0),
            first_cs: SeqLock::new(waiting::UNSET),
            exit_cs: SeqLock::new(0),
            stamps: IsrBuf::new(0),
            frame: IsrBuf::new(0),
            restore: AtomicBool::new(false),
        }
    }

    /// The transition-request register. The firmware stores `Waiting` here
    /// once at boot; after that only the states themselves write it.
    pub fn state(&self) -> &StateRegister {
        &self.state
    }

    pub(crate) fn period(&self) -> Micros {
        self.period.load(Ordering::Relaxed) as Micros
    }

    pub(crate) fn set_period(&self, period: Micros) {
        self.period.store(period as u32, Ordering::Relaxed);
    }

    /// Carrier-sense rising-edge ISR entry point.
    pub fn on_carrier(&self, b: &mut impl Board) {
        match self.handlers.get() {
            StateId::Waiting => waiting::on_carrier(self, b),
            StateId::Syncing => syncing::on_carrier(self, b),
            StateId::Synced => synced::on_carrier(self, b),
            StateId::Leveling | StateId::Receiving => sampler::on_carrier(self, b),
            StateId::DoNothing => (),
        }
    }

    /// Timer ISR entry point.
    pub fn on_timer(&self, b: &mut impl Board) {
        match self.handlers.get() {
            StateId::Waiting => waiting::on_timer(self, b),
            StateId::Syncing => syncing::on_timer(self, b),
            StateId::Synced => synced::on_timer(self, b),
            StateId::Leveling | StateId::Receiving => sampler::on_timer(self, b),
            StateId::DoNothing => (),
        }
    }
}

/// Foreground demodulator state, owned by the main loop.
pub struct Demod {
    prev: Option<StateId>,
    /// Per-layer amplitude estimators, reset by Leveling and re-seeded by
    /// Receiving.
    pub(crate) layers: [sic::Estimator; 2],
    /// Last three decoded symbols, watched for the level-check end mark.
    pub(crate) window: [u8; 3],
    /// Low nibble of a byte whose high nibble hasn't arrived yet.
    pub(crate) pending: Option<u8>,
}

impl Demod {
    pub fn new() -> Self {
        Demod {
            prev: None,
            layers: [sic::Estimator::new(), sic::Estimator::new()],
            window: [0; 3],
            pending: None,
        }
    }

    /// One iteration of the foreground loop: notice a requested transition,
    /// run the exit/init handshake, then give the current state its main
    /// slice.
    pub fn poll(&mut self, rx: &Receiver, b: &mut impl Board) {
        let cur = rx.state.get();
        if self.prev != Some(cur) {
            let prev = self.prev;
            let ctx = match prev {
                Some(p) => self.exit_state(p, rx, b, cur),
                None => Context::default(),
            };
            debug!("{:?} -> {:?}", prev, cur);
            // Both interrupt sources are disarmed by the exit above (or have
            // never been armed), so handing the handlers over is race-free.
            rx.handlers.set(cur);
            self.init_state(cur, rx, b, prev, ctx);
            self.prev = Some(cur);
        }
        self.run_main(cur, rx, b);
    }

    fn exit_state(
        &mut self,
        prev: StateId,
        rx: &Receiver,
        b: &mut impl Board,
        next: StateId,
    ) -> Context {
        match prev {
            StateId::Waiting => waiting::exit(rx, self, b, next),
            StateId::Syncing => syncing::exit(rx, self, b, next),
            StateId::Synced => synced::exit(rx, self, b, next),
            StateId::Leveling => leveling::exit(rx, self, b, next),
            StateId::Receiving => receiving::exit(rx, self, b, next),
            StateId::DoNothing => Context::default(),
        }
    }

    fn init_state(
        &mut self,
        cur: StateId,
        rx: &Receiver,
        b: &mut impl Board,
        prev: Option<StateId>,
        ctx: Context,
    ) {
        match cur {
            StateId::Waiting => waiting::init(rx, self, b, prev, ctx),
            StateId::Syncing => syncing::init(rx, self, b, prev, ctx),
            StateId::Synced => synced::init(rx, self, b, prev, ctx),
            StateId::Leveling => leveling::init(rx, self, b, prev, ctx),
            StateId::Receiving => receiving::init(rx, self, b, prev, ctx),
            StateId::DoNothing => do_nothing::init(rx, self, b, prev, ctx),
        }
    }

    fn run_main(&mut self, cur: StateId, rx: &Receiver, b: &mut impl Board) {
        match cur {
            StateId::Leveling => leveling::main(rx, self, b),
            StateId::Receiving => receiving::main(rx, self, b),
            // The timing-recovery states do all their work in ISRs.
            _ => (),
        }
    }
}
