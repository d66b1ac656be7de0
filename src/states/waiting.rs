//! Waiting: idle until a preamble announces itself.
//!
//! Two carrier edges in quick succession are the start of a preamble; the
//! gap between them is the first estimate of the chip period, handed to
//! Syncing for refinement. A single edge that gets no follow-up within
//! [`timing::NOISE_TIMEOUT`] is written off as noise.

use crate::board::Board;
use crate::clock::Micros;
use crate::context::Context;
use crate::receiver::{Demod, Receiver};
use crate::state::StateId;
use crate::timing;

/// Sentinel for "no first edge on record".
pub(crate) const UNSET: Micros = Micros::MAX;

pub(crate) fn init(
    rx: &Receiver,
    _dm: &mut Demod,
    b: &mut impl Board,
    _prev: Option<StateId>,
    _ctx: Context,
) {
    rx.first_cs.store(UNSET);
    b.listen_carrier(true);
    b.set_timer_period(timing::NOISE_TIMEOUT);
    b.stop_timer(); // armed by the first edge, not before
}

pub(crate) fn on_carrier(rx: &Receiver, b: &mut impl Board) {
    if rx.first_cs.load() != UNSET {
        // Second edge: that's a preamble.
        rx.exit_cs.store(b.now());
        rx.state.set(StateId::Syncing);
        return;
    }
    rx.first_cs.store(b.now());
    b.restart_timer();
}

pub(crate) fn on_timer(rx: &Receiver, b: &mut impl Board) {
    // The follow-up never came; forget the edge.
    rx.first_cs.store(UNSET);
    b.stop_timer();
}

pub(crate) fn exit(
    rx: &Receiver,
    _dm: &mut Demod,
    b: &mut impl Board,
    _next: StateId,
) -> Context {
    b.listen_carrier(false);
    b.stop_timer();
    Context {
        period: rx.exit_cs.load() - rx.first_cs.load(),
        last_cs: rx.exit_cs.load(),
        intensities: [0; 2],
    }
}
