//! Firmware entry point for the visible-light receiver.
//!
//! All of the interesting code lives in the `photolink` library; this binary
//! takes the peripherals, hands them to the driver, and wires the vector
//! table entries to the driver's handlers.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        // Firmware must elect one panic-handler crate.
        #[cfg(feature = "panic-itm")]
        extern crate panic_itm;
        #[cfg(all(feature = "panic-halt", not(feature = "panic-itm")))]
        extern crate panic_halt;

        use stm32f4::stm32f407::interrupt;

        use photolink::driver;

        #[cortex_m_rt::entry]
        fn main() -> ! {
            let cp = cortex_m::peripheral::Peripherals::take().unwrap();
            let p = stm32f4::stm32f407::Peripherals::take().unwrap();
            driver::run(cp, p)
        }

        /// System clock tick.
        #[interrupt]
        fn TIM3() {
            driver::sys_tick_isr()
        }

        /// Chip-sample / timeout timer.
        #[interrupt]
        fn TIM2() {
            driver::chip_timer_isr()
        }

        /// Carrier-sense edge.
        #[interrupt]
        fn EXTI0() {
            driver::carrier_isr()
        }
    } else {
        fn main() {
            eprintln!("the receiver drives bare-metal hardware; \
                       build for a thumbv7em target to get firmware");
            std::process::exit(1);
        }
    }
}
