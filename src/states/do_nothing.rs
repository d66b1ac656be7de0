//! DoNothing: terminal diagnostic state.
//!
//! Never entered in normal operation; it exists so a debugging build can
//! route any transition here and read what the previous state would have
//! handed onward. Dumps the inbound context once, then parks.

use crate::board::Board;
use crate::context::Context;
use crate::receiver::{Demod, Receiver};
use crate::state::StateId;

pub(crate) fn init(
    _rx: &Receiver,
    _dm: &mut Demod,
    b: &mut impl Board,
    prev: Option<StateId>,
    ctx: Context,
) {
    b.diag(format_args!("parked; arrived from {:?}", prev));
    b.diag(format_args!("        period: {}", ctx.period));
    b.diag(format_args!("       last CS: {}", ctx.last_cs));
    b.diag(format_args!("intensities[0]: {}", ctx.intensities[0]));
    b.diag(format_args!("intensities[1]: {}", ctx.intensities[1]));
}
