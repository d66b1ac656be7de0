//! Leveling: measure per-layer amplitude from the level-check training.
//!
//! Entered one chip period before the training pattern starts, so the
//! sampler's first frame lines up with the first training frame. Each
//! completed frame runs through the decoder purely to feed the amplitude
//! estimators; the decoded symbols only matter for spotting
//! [`timing::LEVEL_CHECK_MARK`], the tail of the training, at which point
//! the estimates are frozen into the Context and Receiving takes over.

use crate::board::Board;
use crate::context::Context;
use crate::receiver::{Demod, Receiver};
use crate::state::StateId;
use crate::states::sampler;
use crate::timing;

pub(crate) fn init(
    rx: &Receiver,
    dm: &mut Demod,
    b: &mut impl Board,
    _prev: Option<StateId>,
    ctx: Context,
) {
    dm.layers = [sic::Estimator::new(), sic::Estimator::new()];
    // Seed the edge stamp with the training start handed over by Synced, so
    // a transmitter that dies before ever pulsing again still trips the
    // carrier-loss fallback.
    sampler::start(rx, b, &ctx, ctx.last_cs);
}

pub(crate) fn main(rx: &Receiver, dm: &mut Demod, _b: &mut impl Board) {
    if !rx.frame.is_full() {
        return;
    }

    let mut frame = rx.frame.snapshot();
    let symbol = sic::decode(&mut frame, &mut dm.layers);

    dm.window = [dm.window[1], dm.window[2], symbol];
    if dm.window == timing::LEVEL_CHECK_MARK {
        rx.state.set(StateId::Receiving);
    }

    rx.frame.reset();
}

pub(crate) fn exit(
    rx: &Receiver,
    dm: &mut Demod,
    b: &mut impl Board,
    _next: StateId,
) -> Context {
    sampler::stop(b);
    Context {
        period: rx.period(),
        last_cs: 0,
        intensities: [dm.layers[0].magnitude(), dm.layers[1].magnitude()],
    }
}
