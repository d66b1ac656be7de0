//! Syncing: measure the chip period from the preamble.
//!
//! Collects a buffer of 64 carrier-edge timestamps, keeping a timeout alive
//! across them; the period handed onward is the mean of the 63 inter-arrival
//! gaps. If the edges dry up for 1.5 estimated periods before the buffer
//! fills, the preamble was a mirage and we fall back to Waiting.

use crate::board::Board;
use crate::context::Context;
use crate::receiver::{Demod, Receiver};
use crate::state::StateId;

pub(crate) fn init(
    rx: &Receiver,
    _dm: &mut Demod,
    b: &mut impl Board,
    _prev: Option<StateId>,
    ctx: Context,
) {
    b.set_timer_period(ctx.period * 3 / 2); // grace margin over one period
    rx.stamps.reset();
    b.listen_carrier(true);
    // The timeout clock starts running at the first edge below; the
    // preamble that brought us here is still flowing, so one always comes.
}

pub(crate) fn on_carrier(rx: &Receiver, b: &mut impl Board) {
    b.restart_timer(); // keep-alive
    rx.stamps.push(b.now());
    if rx.stamps.is_full() {
        rx.state.set(StateId::Synced);
    }
}

pub(crate) fn on_timer(rx: &Receiver, b: &mut impl Board) {
    rx.state.set(StateId::Waiting);
    b.stop_timer();
}

pub(crate) fn exit(
    rx: &Receiver,
    _dm: &mut Demod,
    b: &mut impl Board,
    next: StateId,
) -> Context {
    b.listen_carrier(false);
    b.stop_timer();

    // Nothing worth bequeathing on the failure path.
    if next == StateId::Waiting {
        return Context::default();
    }

    let stamps = rx.stamps.snapshot();
    let n = stamps.len();
    Context {
        period: (stamps[n - 1] - stamps[0]) / (n as u64 - 1),
        last_cs: stamps[n - 1],
        intensities: [0; 2],
    }
}
