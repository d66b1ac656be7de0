//! Hand-off data passed from a state's exit to its successor's init.

use crate::clock::Micros;

/// What one state bequeaths to the next.
///
/// Produced exactly once per transition by the exiting state, consumed by
/// the entering state's init, and dead afterwards. States that have nothing
/// to say (every failure path back to Waiting) hand over the default.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    /// Estimated chip period in microseconds. Positive in every hand-off to
    /// Syncing, Synced, Leveling and Receiving.
    pub period: Micros,
    /// Timestamp of the most recent carrier-sense edge the producing state
    /// observed (adjusted where the protocol calls for it, see the Synced
    /// exit).
    pub last_cs: Micros,
    /// Per-layer amplitude estimates in ADC units, layer 1 first.
    pub intensities: [i32; 2],
}
