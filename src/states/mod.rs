//! The receiver's operating states, one module each.
//!
//! Each state owns the carrier-sense and timer interrupts strictly between
//! its `init` and its `exit`; the exit is obligated to disarm whatever the
//! init armed before it returns its [`Context`](crate::context::Context).

pub(crate) mod do_nothing;
pub(crate) mod leveling;
pub(crate) mod receiving;
pub(crate) mod sampler;
pub(crate) mod synced;
pub(crate) mod syncing;
pub(crate) mod waiting;
