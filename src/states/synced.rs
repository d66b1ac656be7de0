//! Synced: ride the preamble until it stops.
//!
//! Every carrier edge re-anchors an end-of-carrier timer set slightly long
//! (9/8 of a period), so the timer only ever expires into a slot that had no
//! edge. That missing edge is the preamble stop mark doing its job: the
//! level-check training starts one period after the last edge seen.

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
    rx.set_period(ctx.period);
    rx.last_cs.store(ctx.last_cs);
    b.set_timer_period(ctx.period * 9 / 8); // grace: expire past the next slot
    b.listen_carrier(true);
    // Started by the first edge's restart, like the Syncing timeout.
}

pub(crate) fn on_carrier(rx: &Receiver, b: &mut impl Board) {
    rx.last_cs.store(b.now());
    b.restart_timer(); // re-sync the phase to every observed edge
}

pub(crate) fn on_timer(rx: &Receiver, b: &mut impl Board) {
    // No edge in the slot that just closed: the preamble is over.
    if b.now() - rx.last_cs.load() > rx.period() {
        rx.state.set(StateId::Leveling);
    }
}

pub(crate) fn exit(
    rx: &Receiver,
    _dm: &mut Demod,
    b: &mut impl Board,
    _next: StateId,
) -> Context {
    b.listen_carrier(false);
    b.stop_timer();
    let period = rx.period();
    Context {
        period,
        // The first training chip lands one period after the last edge.
        last_cs: rx.last_cs.load() + period,
        intensities: [0; 2],
    }
}
