//! The chip-sampling machinery shared by Leveling and Receiving.
//!
//! Both states run the same two ISRs: the carrier handler just timestamps
//! edges, and the timer handler reads the photodiode once per chip period,
//! watches for carrier loss, and keeps the sample instant centered in its
//! chip slot.
//!
//! Phase correction works by stealing one timer interval: when an edge shows
//! the sample point hugging a slot boundary, the next interval is stretched
//! to 11/8 of a period (sampling too early) or cut to 5/8 (too late). The
//! shifted expiry still takes its sample, then the cadence snaps back to one
//! period. The nudge is bounded at 3/8 of a period so a single correction
//! can never cross a whole slot.

use core::sync::atomic::Ordering;

use crate::board::Board;
use crate::clock::Micros;
use crate::context::Context;
use crate::receiver::Receiver;
use crate::state::StateId;
use crate::timing;

/// Arms both interrupt sources for a sampling state. The first sample fires
/// one period from now.
pub(crate) fn start(rx: &Receiver, b: &mut impl Board, ctx: &Context, seed_cs: Micros) {
    rx.frame.reset();
    rx.set_period(ctx.period);
    rx.restore.store(false, Ordering::Relaxed);
    rx.last_cs.store(seed_cs);
    b.set_timer_period(ctx.period);
    b.restart_timer();
    b.listen_carrier(true);
}

/// Disarms what [`start`] armed.
pub(crate) fn stop(b: &mut impl Board) {
    b.stop_timer();
    b.listen_carrier(false);
}

pub(crate) fn on_carrier(rx: &Receiver, b: &mut impl Board) {
    rx.last_cs.store(b.now());
}

pub(crate) fn on_timer(rx: &Receiver, b: &mut impl Board) {
    // If this expiry ends a phase-shifted interval, restore the normal
    // cadence first; the shifted interval still counts as a sample slot.
    if rx.restore.swap(false, Ordering::Relaxed) {
        b.set_timer_period(rx.period());
        b.restart_timer();
    }

    rx.frame.push(b.sample());
    #[cfg(feature = "measurement")]
    b.debug_edge();

    let period = rx.period();
    let last_cs = rx.last_cs.load();
    let diff = b.now() - last_cs;

    // Carrier gone?
    if last_cs > 0 && diff > timing::CARRIER_LOSS_PERIODS * period {
        rx.state.set(StateId::Waiting);
    }

    // No edge recent enough to judge the phase against.
    if diff > period {
        return;
    }

    if diff < period / 4 {
        // Sampling right after the edge: too early. Push the next sample
        // out.
        b.set_timer_period(period * 11 / 8);
    } else if diff > period * 3 / 4 {
        // Almost a full period since the edge: too late. Pull the next
        // sample in.
        b.set_timer_period(period * 5 / 8);
    } else {
        return;
    }
    rx.restore.store(true, Ordering::Relaxed);
    b.restart_timer();
}
