//! The seam between the state machine and the hardware.
//!
//! Everything the receiver does to the outside world goes through this
//! trait: one rearmable timer, the carrier-sense edge interrupt, the
//! photodiode ADC, and the serial sink. The firmware driver implements it
//! over stm32f4 registers; the test harness implements it over a simulated
//! timeline and drives the state machine through whole transmissions on the
//! host.
//!
//! Handler *identity* is not part of the seam. Which state's code runs when
//! the timer fires is decided by the receiver's own handler-owner register,
//! so "attach" and "detach" reduce to arming and disarming the sources.

use crate::clock::Micros;
use core::fmt;

pub trait Board {
    /// Snapshot of the system clock.
    fn now(&self) -> Micros;

    /// One photodiode sample, in ADC units.
    fn sample(&mut self) -> i32;

    /// Arms or disarms the carrier-sense rising-edge interrupt.
    fn listen_carrier(&mut self, on: bool);

    /// Sets the timer period without touching the counter. Takes effect at
    /// the next restart, or at the next reload if the timer is running.
    fn set_timer_period(&mut self, period: Micros);

    /// Zeroes the timer counter and starts it; it then fires once per
    /// period until stopped.
    fn restart_timer(&mut self);

    /// Stops the timer and discards any pending expiry.
    fn stop_timer(&mut self);

    /// Pushes one decoded byte to the serial sink.
    fn emit(&mut self, byte: u8);

    /// Writes a human-readable diagnostic line. Only the terminal
    /// diagnostic state uses this; it must never be called from an ISR.
    fn diag(&mut self, args: fmt::Arguments);

    /// Toggles the debug clock pin. Wired to a spare GPIO under the
    /// `measurement` feature, a no-op otherwise.
    fn debug_edge(&mut self);
}
