//! Receiving: stream decoded bytes until the carrier dies.
//!
//! Runs the same sampler as Leveling, but the estimators arrive pre-seeded
//! from the level check with enough inertia that payload frames refine them
//! instead of starting over. Two frames make a byte, low nibble first; a
//! lone nibble cut off by carrier loss is discarded, not emitted.

use crate::board::Board;
use crate::context::Context;
use crate::receiver::{Demod, Receiver};
use crate::state::StateId;
use crate::states::sampler;

pub(crate) fn init(
    rx: &Receiver,
    dm: &mut Demod,
    b: &mut impl Board,
    _prev: Option<StateId>,
    ctx: Context,
) {
    dm.pending = None;
    dm.layers = [
        sic::Estimator::seeded(ctx.intensities[0]),
        sic::Estimator::seeded(ctx.intensities[1]),
    ];
    sampler::start(rx, b, &ctx, 0);
}

pub(crate) fn main(rx: &Receiver, dm: &mut Demod, b: &mut impl Board) {
    if !rx.frame.is_full() {
        return;
    }

    let mut frame = rx.frame.snapshot();
    let nibble = sic::decode(&mut frame, &mut dm.layers);

    match dm.pending.take() {
        None => dm.pending = Some(nibble),
        Some(lo) => b.emit(lo | nibble << 4),
    }

    rx.frame.reset();
}

pub(crate) fn exit(
    _rx: &Receiver,
    dm: &mut Demod,
    b: &mut impl Board,
    _next: StateId,
) -> Context {
    sampler::stop(b);
    dm.pending = None;
    Context::default()
}
