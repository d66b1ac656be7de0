//! Protocol and scheduling constants.
//!
//! Ratios that the states apply to a measured period (grace margins, phase
//! nudges) live at their use sites, written as the `period * n / d`
//! arithmetic they are; this module holds the absolute quantities.

use crate::clock::Micros;

/// Quantum of the system clock: the tick timer fires this often and the
/// counter advances by this much. Chosen to divide evenly into what the
/// tick timer hardware can express while keeping the read error far below a
/// quarter chip period at the fastest supported chip rate.
pub const TICK_MICROS: Micros = 57;

/// Carrier-sense edges collected by Syncing before it trusts its period
/// estimate. 64 edges give 63 inter-arrival gaps to average.
pub const SYNC_STAMPS: usize = 64;

/// A lone carrier edge with no follow-up within this window was noise.
pub const NOISE_TIMEOUT: Micros = 1_000_000;

/// Chip periods of carrier silence after which Leveling and Receiving give
/// the transmission up for dead.
pub const CARRIER_LOSS_PERIODS: u64 = 16;

/// The last three symbols of the level-check training, as decoded on the
/// wire. Seeing this window in Leveling means the training is over and
/// payload follows.
pub const LEVEL_CHECK_MARK: [u8; 3] = [0x0C, 0x08, 0x00];
